//! Named Indian indices and their provider codes

/// A named index: provider code, preferred display name and accepted aliases.
///
/// Aliases are matched exactly against normalized (uppercase, trimmed) input.
#[derive(Debug, Clone, Copy)]
pub struct IndexEntry {
    pub code: &'static str,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

pub const INDIAN_INDICES: &[IndexEntry] = &[
    IndexEntry {
        code: "^NSEI",
        name: "NIFTY 50",
        aliases: &["NIFTY", "NIFTY50", "NIFTY 50"],
    },
    IndexEntry {
        code: "^NSMIDCP",
        name: "NIFTY NEXT 50",
        aliases: &["NIFTY NEXT 50", "NIFTYNEXT50"],
    },
    IndexEntry {
        code: "^NSEBANK",
        name: "NIFTY BANK",
        aliases: &["BANKNIFTY", "NIFTY BANK", "NIFTYBANK"],
    },
    IndexEntry {
        code: "^CNXFIN",
        name: "NIFTY FINANCIAL SERVICES",
        aliases: &["FINNIFTY", "NIFTYFIN", "NIFTY FIN SERVICE", "NIFTY FINANCIAL SERVICES"],
    },
    IndexEntry {
        code: "^CNXIT",
        name: "NIFTY IT",
        aliases: &["NIFTY IT", "NIFTYIT"],
    },
    IndexEntry {
        code: "^CNXFMCG",
        name: "NIFTY FMCG",
        aliases: &["NIFTY FMCG", "NIFTYFMCG"],
    },
    IndexEntry {
        code: "^CNXAUTO",
        name: "NIFTY AUTO",
        aliases: &["NIFTY AUTO", "NIFTYAUTO"],
    },
    IndexEntry {
        code: "^CNXMETAL",
        name: "NIFTY METAL",
        aliases: &["NIFTY METAL", "NIFTYMETAL"],
    },
    IndexEntry {
        code: "^CNXPHARMA",
        name: "NIFTY PHARMA",
        aliases: &["NIFTY PHARMA", "NIFTYPHARMA"],
    },
    IndexEntry {
        code: "^CNXREALTY",
        name: "NIFTY REALTY",
        aliases: &["NIFTY REALTY", "NIFTYREALTY"],
    },
    IndexEntry {
        code: "^CNXPSUBANK",
        name: "NIFTY PSU BANK",
        aliases: &["NIFTY PSU BANK", "NIFTYPSUBANK"],
    },
    IndexEntry {
        code: "^CNXENERGY",
        name: "NIFTY ENERGY",
        aliases: &["NIFTY ENERGY", "NIFTYENERGY"],
    },
    IndexEntry {
        code: "^NSEMDCP50",
        name: "NIFTY MIDCAP 50",
        aliases: &["NIFTY MIDCAP 50", "NIFTYMIDCAP50"],
    },
    IndexEntry {
        code: "^NSEMDCP100",
        name: "NIFTY MIDCAP 100",
        aliases: &["NIFTY MIDCAP 100", "NIFTYMIDCAP100"],
    },
    IndexEntry {
        code: "^NSESMLCP50",
        name: "NIFTY SMALLCAP 50",
        aliases: &["NIFTY SMALLCAP 50", "NIFTYSMALLCAP50"],
    },
    IndexEntry {
        code: "^NSESMLCP100",
        name: "NIFTY SMALLCAP 100",
        aliases: &["NIFTY SMALLCAP 100", "NIFTYSMALLCAP100"],
    },
    IndexEntry {
        code: "^BSESN",
        name: "SENSEX",
        aliases: &["SENSEX", "BSESENSEX", "BSE SENSEX"],
    },
    IndexEntry {
        code: "^BSESN50",
        name: "SENSEX NEXT 50",
        aliases: &["SENSEX NEXT 50", "SENSEXNEXT50"],
    },
    IndexEntry {
        code: "^INDIAVIX",
        name: "INDIA VIX",
        aliases: &["INDIA VIX", "INDIAVIX"],
    },
];

/// Provider code for an index alias. `alias` must already be normalized.
pub fn index_code(alias: &str) -> Option<&'static str> {
    INDIAN_INDICES
        .iter()
        .find(|entry| entry.aliases.iter().any(|candidate| *candidate == alias))
        .map(|entry| entry.code)
}

/// Display name for a provider index code
pub fn index_name(code: &str) -> Option<&'static str> {
    INDIAN_INDICES
        .iter()
        .find(|entry| entry.code == code)
        .map(|entry| entry.name)
}

/// Display names of all named indices, sorted
pub fn index_names() -> Vec<&'static str> {
    let mut names: Vec<_> = INDIAN_INDICES.iter().map(|entry| entry.name).collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_aliases_share_code() {
        assert_eq!(index_code("NIFTY"), Some("^NSEI"));
        assert_eq!(index_code("NIFTY50"), index_code("NIFTY"));
        assert_eq!(index_code("FINNIFTY"), index_code("NIFTYFIN"));
        assert_eq!(index_code("SENSEX"), index_code("BSESENSEX"));
    }

    #[test]
    fn test_unknown_alias() {
        assert_eq!(index_code("RELIANCE"), None);
        assert_eq!(index_code("nifty"), None);
    }

    #[test]
    fn test_display_name_is_an_alias() {
        for entry in INDIAN_INDICES {
            assert_eq!(index_code(entry.name), Some(entry.code), "{}", entry.name);
            assert_eq!(index_name(entry.code), Some(entry.name));
        }
    }

    #[test]
    fn test_table_is_unambiguous() {
        let mut codes = HashSet::new();
        let mut aliases = HashSet::new();
        for entry in INDIAN_INDICES {
            assert!(codes.insert(entry.code), "duplicate code {}", entry.code);
            assert!(entry.code.starts_with('^'));
            for alias in entry.aliases {
                assert!(aliases.insert(*alias), "duplicate alias {alias}");
                assert_eq!(*alias, alias.trim().to_uppercase());
            }
        }
    }

    #[test]
    fn test_index_names_sorted() {
        let names = index_names();
        assert_eq!(names.len(), INDIAN_INDICES.len());
        assert!(names.windows(2).all(|w| w[0] <= w[1]));
    }
}
