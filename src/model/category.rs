//! Job (class) codes shown on a character profile
//!
//! The profile page only exposes the active job as an icon, so every code is
//! paired with the path of its icon on the image host. Paths are stored with
//! the `https://img.finalfantasyxiv.com` host stripped.

use serde::{Serialize, Serializer};
use std::fmt;

macro_rules! categories {
    ($($variant:ident => $code:literal, $icon:literal;)+) => {
        /// Closed set of job codes an entrant can be enriched with
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub enum Category {
            $($variant,)+
            /// Profile not public, not fetched, or icon not recognised
            #[default]
            Unknown,
        }

        impl Category {
            /// Returns the short job code (e.g. `"WHM"`), or `"UNKNOWN"`
            pub fn code(&self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)+
                    Self::Unknown => "UNKNOWN",
                }
            }

            /// Parses a job code as written by [`Category::code`]
            #[cfg(test)]
            pub fn from_code(code: &str) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    "UNKNOWN" => Some(Self::Unknown),
                    _ => None,
                }
            }

            /// Looks up the job whose icon lives at `path` on the image host
            pub fn from_icon_path(path: &str) -> Option<Self> {
                match path {
                    $($icon => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Every known job, in table order
            #[cfg(test)]
            pub fn all_known() -> &'static [Category] {
                &[$(Self::$variant,)+]
            }
        }
    };
}

categories! {
    Gla => "GLA", "/h/U/F5JzG9RPIKFSogtaKNBk455aYA.png";
    Pgl => "PGL", "/h/V/iW7IBKQ7oglB9jmbn6LwdZXkWw.png";
    Mrd => "MRD", "/h/N/St9rjDJB3xNKGYg-vwooZ4j6CM.png";
    Lnc => "LNC", "/h/k/tYTpoSwFLuGYGDJMff8GEFuDQs.png";
    Arc => "ARC", "/h/Q/ZpqEJWYHj9SvHGuV9cIyRNnIkk.png";
    Cnj => "CNJ", "/h/s/gl62VOTBJrm7D_BmAZITngUEM8.png";
    Thm => "THM", "/h/4/IM3PoP6p06GqEyReygdhZNh7fU.png";
    Crp => "CRP", "/h/v/YCN6F-xiXf03Ts3pXoBihh2OBk.png";
    Bsm => "BSM", "/h/5/EEHVV5cIPkOZ6v5ALaoN5XSVRU.png";
    Arm => "ARM", "/h/G/Rq5wcK3IPEaAB8N-T9l6tBPxCY.png";
    Gsm => "GSM", "/h/L/LbEjgw0cwO_2gQSmhta9z03pjM.png";
    Ltw => "LTW", "/h/b/ACAcQe3hWFxbWRVPqxKj_MzDiY.png";
    Wvr => "WVR", "/h/X/E69jrsOMGFvFpCX87F5wqgT_Vo.png";
    Alc => "ALC", "/h/C/bBVQ9IFeXqjEdpuIxmKvSkqalE.png";
    Cul => "CUL", "/h/m/1kMI2v_KEVgo30RFvdFCyySkFo.png";
    Min => "MIN", "/h/A/aM2Dd6Vo4HW_UGasK7tLuZ6fu4.png";
    Btn => "BTN", "/h/I/jGRnjIlwWridqM-mIPNew6bhHM.png";
    Fsh => "FSH", "/h/x/B4Azydbn7Prubxt7OL9p1LZXZ0.png";
    Pld => "PLD", "/h/E/d0Tx-vhnsMYfYpGe9MvslemEfg.png";
    Mnk => "MNK", "/h/K/HW6tKOg4SOJbL8Z20GnsAWNjjM.png";
    War => "WAR", "/h/y/A3UhbjZvDeN3tf_6nJ85VP0RY0.png";
    Drg => "DRG", "/h/m/gX4OgBIHw68UcMU79P7LYCpldA.png";
    Brd => "BRD", "/h/F/KWI-9P3RX_Ojjn_mwCS2N0-3TI.png";
    Whm => "WHM", "/h/7/i20QvSPcSQTybykLZDbQCgPwMw.png";
    Blm => "BLM", "/h/P/V01m8YRBYcIs5vgbRtpDiqltSE.png";
    Acn => "ACN", "/h/e/VYP1LKTDpt8uJVvUT7OKrXNL9E.png";
    Smn => "SMN", "/h/h/4ghjpyyuNelzw1Bl0sM_PBA_FE.png";
    Sch => "SCH", "/h/7/WdFey0jyHn9Nnt1Qnm-J3yTg5s.png";
    Rog => "ROG", "/h/y/wdwVVcptybfgSruoh8R344y_GA.png";
    Nin => "NIN", "/h/0/Fso5hanZVEEAaZ7OGWJsXpf3jw.png";
    Mch => "MCH", "/h/E/vmtbIlf6Uv8rVp2YFCWA25X0dc.png";
    Drk => "DRK", "/h/l/5CZEvDOMYMyVn2td9LZigsgw9s.png";
    Ast => "AST", "/h/1/erCgjnMSiab4LiHpWxVc-tXAqk.png";
    Sam => "SAM", "/h/m/KndG72XtCFwaq1I1iqwcmO_0zc.png";
    Rdm => "RDM", "/h/q/s3MlLUKmRAHy0pH57PnFStHmIw.png";
    Blu => "BLU", "/h/p/jdV3RRKtWzgo226CC09vjen5sk.png";
    Gnb => "GNB", "/h/8/hg8ofSSOKzqng290No55trV4mI.png";
    Dnc => "DNC", "/h/t/HK0jQ1y7YV9qm30cxGOVev6Cck.png";
    Rpr => "RPR", "/h/7/cLlXUaeMPJDM2nBhIeM-uDmPzM.png";
    Sge => "SGE", "/h/g/_oYApASVVReLLmsokuCJGkEpk0.png";
    Vpr => "VPR", "/h/C/WojNTqMJ_Ye1twvkIhw825zc20.png";
    Pct => "PCT", "/h/_/kLob-U-yh652LQPX1NHpLlUYQY.png";
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_icon_lookup() {
        assert_eq!(
            Category::from_icon_path("/h/7/i20QvSPcSQTybykLZDbQCgPwMw.png"),
            Some(Category::Whm)
        );
        assert_eq!(
            Category::from_icon_path("/h/_/kLob-U-yh652LQPX1NHpLlUYQY.png"),
            Some(Category::Pct)
        );
        assert_eq!(Category::from_icon_path("/h/0/nope.png"), None);
    }

    #[test]
    fn test_code_roundtrip() {
        for category in Category::all_known() {
            assert_eq!(Category::from_code(category.code()), Some(*category));
        }
        assert_eq!(Category::from_code("UNKNOWN"), Some(Category::Unknown));
        assert_eq!(Category::from_code("XYZ"), None);
    }

    #[test]
    fn test_codes_are_unique() {
        let codes: HashSet<_> = Category::all_known().iter().map(|c| c.code()).collect();
        assert_eq!(codes.len(), Category::all_known().len());
    }

    #[test]
    fn test_unknown_is_default() {
        assert_eq!(Category::default(), Category::Unknown);
        assert_eq!(Category::Unknown.to_string(), "UNKNOWN");
        assert!(!Category::all_known().contains(&Category::Unknown));
    }
}
