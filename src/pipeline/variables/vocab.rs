//! Closed label sets used by enum-typed variables, with their export codes.

use super::types::{SubsetRule, Term};

/// Export code for a missing or unrecognised label.
pub const UNKNOWN_CODE: i64 = 99;

const fn term(label: &'static str, code: i64) -> Term {
    Term { label, code }
}

pub static SMOKING_STATUS: &[Term] = &[
    term("former_smoker", 2),
    term("current_smoker", 1),
    term("never_smoker", 3),
];

pub static FAMILY_MEMBER: &[Term] = &[
    term("father", 1),
    term("mother", 2),
    term("siblings", 3),
    term("children", 4),
    term("second_degree_relative", 5),
];

pub static CANCER_TYPES: &[Term] = &[
    term("other", 11),
    term("colorectal", 12),
    term("breast", 1),
    term("ovarian", 2),
    term("uterine", 3),
    term("lung", 4),
    term("gastric", 5),
    term("prostate", 6),
    term("brain", 7),
    term("thyroid", 8),
    term("liver", 9),
    term("cholangiocarcinoma", 10),
];

pub static RELATIONSHIP_TO_PATIENT: &[Term] = &[
    term("first_degree_relative", 1),
    term("second_degree_relative", 2),
    term("other", 3),
];

pub static CANCER_THERAPY: &[Term] = &[
    term("chemotherapy", 1),
    term("surgery", 2),
    term("radiation", 3),
    term("other", 4),
];

pub static STAGE_CRC: &[Term] = &[
    term("stage_I", 1),
    term("stage_IIa", 2),
    term("stage_IIb", 3),
    term("stage_IIIa", 4),
    term("stage_IIIb", 5),
    term("stage_IIIc", 6),
    term("stage_IV", 7),
];

pub static IBD_TYPE: &[Term] = &[term("cd", 1), term("uc", 2), term("ibd_u", 3)];

pub static MONTREAL_EXTENT_UC: &[Term] = &[
    term("E1 Ulcerative proctitis", 1),
    term("E2 Left-sided colitis", 2),
    term("E3 Extensive UC", 3),
];

pub static MONTREAL_EXTENT_IBDU: &[Term] = &[
    term("E1 Proctitis", 1),
    term("E2 Left-sided colitis", 2),
    term("E3 Extensive colitis", 3),
];

pub static CROHNS_COLITIS_EXTENT: &[Term] = &[
    term("Pancolonic involvement", 1),
    term("34-67% colonic involvement", 2),
    term("10-33% colonic involvement", 3),
    term("<10%", 4),
    term("Endoscopic remission", 5),
    term("Not applicable", 88),
];

pub static CROHNS_BEHAVIOUR: &[Term] = &[
    term("B1 Non-stricturing, non-penetrating", 1),
    term("B2 Stricturing", 2),
    term("B3 Penetrating", 3),
];

pub const L1_ILEAL: &str = "L1 Ileal";
pub const L2_COLONIC: &str = "L2 Colonic";
pub const L3_ILEOCOLONIC: &str = "L3 Ileocolonic";
pub const L4_UPPER: &str = "L4 Isolated upper disease";

pub static CROHNS_LOCATION: &[Term] = &[
    term(L1_ILEAL, 1),
    term(L2_COLONIC, 2),
    term(L3_ILEOCOLONIC, 3),
    term(L4_UPPER, 4),
];

/// Montreal location codes: combined L4 phenotypes take precedence over
/// single locations. First matching rule wins.
pub static CROHNS_LOCATION_CODES: &[SubsetRule] = &[
    SubsetRule { labels: &[L3_ILEOCOLONIC, L4_UPPER], code: 7 },
    SubsetRule { labels: &[L2_COLONIC, L4_UPPER], code: 6 },
    SubsetRule { labels: &[L1_ILEAL, L4_UPPER], code: 5 },
    SubsetRule { labels: &[L4_UPPER], code: 4 },
    SubsetRule { labels: &[L3_ILEOCOLONIC], code: 3 },
    SubsetRule { labels: &[L2_COLONIC], code: 2 },
    SubsetRule { labels: &[L1_ILEAL], code: 1 },
];

pub static IBD_SURGERY: &[Term] = &[
    term("small bowel resection/ileocolic resection", 1),
    term("total proctocolectomy", 2),
    term("subtotal colectomy", 3),
    term("segmental (partial) colonic resection", 4),
    term("diversion", 5),
    term("ileostomy (non-diversion)", 6),
    term("fistula/abscess related procedure", 7),
];

pub static NEOPLASIA_FINDINGS: &[Term] = &[
    term("low_grade_dysplasia", 1),
    term("high_grade_dysplasia", 2),
    term("indefinite_grade_dysplasia", 3),
];

pub static PSC_EXTENT: &[Term] = &[
    term("Extra-hepatic bile ducts", 1),
    term("Intra-hepatic bile ducts", 2),
    term("Both intra-and extra-hepatic", 3),
];

pub static EVENT_FREQUENCY: &[Term] = &[
    term("Never", 1),
    term("Once", 2),
    term("Two or more", 3),
];
