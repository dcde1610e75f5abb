//! Small helpers.

use std::sync::OnceLock;

use regex::Regex;

pub fn sanitize_symbol(sym: &str) -> String {
    sym.trim().to_uppercase()
}

/// True when a security name carries a depositary-receipt marker
/// ("ADR", "ADS", "American Depositary Shares", ...).
pub fn is_adr_name(name: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"\bADRs?\b|\bADS\b|(?i:depositary)").expect("static ADR pattern")
    });
    re.is_match(name)
}

/// Drop NaN so that it behaves exactly like a missing value.
pub fn known(v: Option<f64>) -> Option<f64> {
    v.filter(|x| !x.is_nan())
}

/// Relative slack under which a sell quantity counts as the whole holding.
const HELD_REL_EPSILON: f64 = 1e-12;

/// Snap `quantity` to `held` when the two differ only by float noise, so a
/// "sell everything" computed elsewhere closes the lot exactly.
pub fn snap_to_held(quantity: f64, held: f64) -> f64 {
    if (quantity - held).abs() <= held.abs() * HELD_REL_EPSILON {
        held
    } else {
        quantity
    }
}

/// Compare two labels the way a human-facing list orders them:
/// case-folded first, then by exact text for a deterministic tie-break.
pub fn locale_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    let fold = |s: &str| s.chars().flat_map(char::to_lowercase).collect::<String>();
    fold(a).cmp(&fold(b)).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn adr_markers() {
        assert!(is_adr_name("ASML Holding N.V. ADR"));
        assert!(is_adr_name("Baidu, Inc. American Depositary Shares"));
        assert!(is_adr_name("PDD Holdings ADS"));
        assert!(!is_adr_name("Adobe Inc."));
        assert!(!is_adr_name("Broadcom Inc."));
        assert!(is_adr_name("Sony Group Corp. DEPOSITARY RECEIPTS"));
        assert!(!is_adr_name("Digital Ads Group"));
        assert!(!is_adr_name("Trade Desk adr-less"));
    }

    #[test]
    fn snap_only_absorbs_float_noise() {
        let held = 0.1 + 0.2;
        assert_eq!(snap_to_held(0.3, held), held);
        assert_eq!(snap_to_held(5.0000000009, 5.0), 5.0000000009);
        assert_eq!(snap_to_held(1e-10, 5e-10), 1e-10);
    }

    #[test]
    fn sanitize_trims_and_uppercases() {
        assert_eq!(sanitize_symbol("  005930.ks "), "005930.KS");
    }

    #[test]
    fn locale_cmp_ignores_case_first() {
        assert_eq!(locale_cmp("apple", "Banana"), Ordering::Less);
        assert_eq!(locale_cmp("Zoetis", "abbott"), Ordering::Greater);
        assert_eq!(locale_cmp("a", "A"), Ordering::Greater);
    }

    #[test]
    fn nan_is_unknown() {
        assert_eq!(known(Some(f64::NAN)), None);
        assert_eq!(known(Some(1.5)), Some(1.5));
    }
}
