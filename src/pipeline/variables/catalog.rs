//! Built-in catalog of IBD registry variables.
//!
//! Order matters: it is the field order of every extraction schema and of
//! the exported findings.

use super::types::{
    ActivationRule, ExportMapping, RecordField, ResolverKind, ValueType, VariableDefinition,
};
use super::vocab::*;

impl VariableDefinition {
    const fn new(
        id: &'static str,
        name: &'static str,
        description: &'static str,
        prompt: &'static str,
        value_type: ValueType,
    ) -> Self {
        Self {
            id,
            name,
            description,
            prompt,
            value_type,
            activation: None,
            resolver: None,
            export_id: None,
            export: None,
        }
    }

    const fn when(self, rule: ActivationRule) -> Self {
        Self { activation: Some(rule), ..self }
    }

    const fn resolve(self, kind: ResolverKind) -> Self {
        Self { resolver: Some(kind), ..self }
    }

    /// Export under the variable's own id.
    const fn export(self, mapping: ExportMapping) -> Self {
        Self { export_id: Some(self.id), export: Some(mapping), ..self }
    }
}

use ActivationRule::{Equals, IsTrue, ListContains, ListExcludes};
use ExportMapping::{Code, CodeList, Flag, Identity, SubsetCode};
use ResolverKind::{AnyTrue, EarliestDate, LeastRecent, ListUnique, MostFrequent, MostRecent};
use ValueType::{Boolean, Date, DateList, Label, LabelList, RecordList};

const CRC: ActivationRule = ListContains { variable: "pers_cancer_hx", label: "colorectal" };
const NON_CRC: ActivationRule = ListExcludes { variable: "pers_cancer_hx", label: "colorectal" };
const UC: ActivationRule = Equals { variable: "ibd_type", label: "uc" };
const IBDU: ActivationRule = Equals { variable: "ibd_type", label: "ibd_u" };
const CD: ActivationRule = Equals { variable: "ibd_type", label: "cd" };
const DYSPLASIA: ActivationRule = IsTrue { variable: "prior_dyspl" };
const PSC: ActivationRule = IsTrue { variable: "psc_hx" };

static RELATIVE_CANCER: &[RecordField] = &[
    RecordField { name: "relationship", terms: RELATIONSHIP_TO_PATIENT },
    RecordField { name: "type", terms: CANCER_TYPES },
];

type Def = VariableDefinition;

pub static VARIABLES: &[VariableDefinition] = &[
    // ── Baseline ──
    Def::new(
        "date_ibd_dx",
        "IBD diagnosis date",
        "What is the date of IBD diagnosis?",
        "What is the date of the patient's IBD diagnosis? This could be either CD, UC or IBD-u.",
        Date,
    )
    .resolve(MostFrequent)
    .export(Identity),
    Def::new(
        "appendectomy",
        "Appendectomy",
        "Has the patient had an appendectomy?",
        "Has the patient had an appendectomy?",
        Boolean,
    )
    .resolve(AnyTrue)
    .export(Flag),
    Def::new(
        "smoking_history",
        "Smoking History",
        "What is the patient's smoking history?",
        "What is the patient's smoking history?",
        Label(SMOKING_STATUS),
    )
    .resolve(MostRecent)
    .export(Code),
    // ── Family history ──
    Def::new(
        "cd_fm_hx",
        "Crohn's disease family history",
        "Is there a family member with a history of CD?",
        "Do the notes explicitly mention a family member with Crohn's disease? Only consider blood relatives.",
        Label(FAMILY_MEMBER),
    )
    .resolve(MostRecent)
    .export(Code),
    Def::new(
        "uc_ic_fm_hx",
        "Ulcerative Colitis family history",
        "Is there a family member with a history of UC?",
        "Do the notes mention a specific family member with Ulcerative colitis?",
        Label(FAMILY_MEMBER),
    )
    .resolve(MostFrequent)
    .export(Code),
    Def::new(
        "ibdu_fam_hx",
        "IBD-U family history",
        "Is there a family member with a history of IBD-U?",
        "Do the notes explicitly mention a family member with IBD-U?",
        Label(FAMILY_MEMBER),
    )
    .resolve(MostFrequent)
    .export(Code),
    // ── Cancer history ──
    Def::new(
        "pers_cancer_hx",
        "Types of cancer",
        "Personal history of cancer",
        "Did the patient have cancer at some point? If so, what type? If the cancer is not in the list of known types or not specified, please reply with 'other'.",
        LabelList(CANCER_TYPES),
    )
    .resolve(ListUnique),
    Def::new(
        "date_dx_crc",
        "Colorectal Cancer Diagnosis Date",
        "What was the date of diagnosis for colorectal cancer?",
        "What was the date of diagnosis for colorectal cancer?",
        Date,
    )
    .when(CRC)
    .resolve(MostFrequent)
    .export(Identity),
    Def::new(
        "type_therapy_crc",
        "Colorectal Cancer Therapy Type",
        "What type of therapy was used for colorectal cancer?",
        "What type of therapy was used for colorectal cancer?",
        Label(CANCER_THERAPY),
    )
    .when(CRC)
    .resolve(MostFrequent)
    .export(Code),
    Def::new(
        "in_remission",
        "In Remission from Colorectal Cancer",
        "Is the patient in remission from colorectal cancer?",
        "Is the patient in remission from colorectal cancer?",
        Boolean,
    )
    .when(CRC)
    .resolve(MostRecent)
    .export(Flag),
    Def::new(
        "stage_ca_crc",
        "Colorectal Cancer Stage",
        "What is the stage of the patient's colorectal cancer?",
        "What is the stage of the patient's colorectal cancer?",
        Label(STAGE_CRC),
    )
    .when(CRC)
    .resolve(MostRecent)
    .export(Code),
    Def::new(
        "date_of_remission",
        "Date of Remission from non-colorectal Cancer",
        "What is the date of remission from non-colorectal cancer?",
        "What is the date of remission from non-colorectal cancer?",
        Date,
    )
    .when(NON_CRC)
    .resolve(MostFrequent)
    .export(Identity),
    Def::new(
        "type_therapy_ncrc",
        "Non-Colorectal Cancer Therapy Type",
        "Type of therapy used for non-colorectal cancer",
        "What type of therapy was used for non-colorectal cancer?",
        Label(CANCER_THERAPY),
    )
    .when(NON_CRC)
    .resolve(MostFrequent)
    .export(Code),
    Def::new(
        "in_remission_ncrc",
        "In Remission from Non-Colorectal Cancer",
        "Is the patient in remission from non-colorectal cancer?",
        "Is the patient in remission from non-colorectal cancer?",
        Boolean,
    )
    .when(NON_CRC)
    .resolve(MostRecent)
    .export(Flag),
    Def::new(
        "fam_cancer_hx",
        "Cancer Family History",
        "Are there family members with a cancer diagnosis?",
        "List the family members and the kind of cancer if present in the notes.",
        RecordList(RELATIVE_CANCER),
    )
    .resolve(ListUnique),
    // ── IBD phenotype ──
    Def::new(
        "ibd_type",
        "IBD type",
        "What type of IBD has been diagnosed?",
        "What type of IBD has been diagnosed?",
        Label(IBD_TYPE),
    )
    .resolve(MostFrequent)
    .export(Code),
    Def::new(
        "montreal_ext_enrol_encnter",
        "Montreal Classification: Extent of UC",
        "What is the Montreal classification of extent of UC at enrollment?",
        "What is the Montreal classification of extent of UC? E1=Involvement limited to the rectum (proximal extent of inflammation is distal to the rectosigmoid junction), E2=Involvement limited to a portion of the colorectum distal to the splenic flexure, E3=Involvement extends proximal to the splenic flexure",
        Label(MONTREAL_EXTENT_UC),
    )
    .when(UC)
    .resolve(MostRecent)
    .export(Code),
    Def::new(
        "montreal_ext_enrol_ibdu",
        "Montreal Classification: Extent of IBD-U",
        "What is the extent of IBD-U at enrollment?",
        "What is the extent of IBD-U?",
        Label(MONTREAL_EXTENT_IBDU),
    )
    .when(IBDU)
    .resolve(LeastRecent)
    .export(Code),
    Def::new(
        "crohn_colitis_baseline",
        "Crohn's Colitis Extent",
        "What is the extent of the patient's Crohn's Colitis?",
        "What is the extent of the patient's Crohn's Colitis?",
        Label(CROHNS_COLITIS_EXTENT),
    )
    .when(CD)
    .resolve(MostRecent)
    .export(Code),
    Def::new(
        "behaviour",
        "Crohn's Disease Behaviour",
        "What is the patient's behaviour state?",
        "What is the patient's behaviour state?",
        Label(CROHNS_BEHAVIOUR),
    )
    .when(CD)
    .resolve(MostRecent)
    .export(Code),
    Def::new(
        "perianal_dis",
        "Perianal Disease",
        "Does the patient have perianal disease?",
        "Does the patient have perianal disease?",
        Boolean,
    )
    .resolve(AnyTrue)
    .export(Flag),
    Def::new(
        "disease_location",
        "Disease Location",
        "What is the most recently reported crohns disease location of the patient?",
        "What is the most recently reported location of crohns in the patient?",
        LabelList(CROHNS_LOCATION),
    )
    .when(CD)
    .resolve(MostRecent)
    .export(SubsetCode(CROHNS_LOCATION_CODES)),
    Def::new(
        "date_hosp",
        "Hospitalization Dates",
        "Any dates at which the patient has been hospitalized.",
        "List any dates at which the patient has been hospitalized. (format: YYYY-MM-DD)",
        DateList,
    )
    .resolve(ListUnique),
    Def::new(
        "base_check_surg",
        "IBD-related Surgery",
        "Check any type of prior IBD-related surgery the patient has undergone.",
        "List any type of prior IBD-related surgery the patient has undergone.",
        LabelList(IBD_SURGERY),
    )
    .resolve(ListUnique)
    .export(CodeList),
    // ── Dysplasia ──
    Def::new(
        "prior_dyspl",
        "Prior Colonic Dysplasia",
        "Does the patient have a prior history of colonic dysplasia?",
        "Does the patient have a history of colonic dysplasia?",
        Boolean,
    )
    .resolve(AnyTrue)
    .export(Flag),
    Def::new(
        "date_surg_dys_crc",
        "Dysplasia or Cancer Surgery Date",
        "When was the date of surgery for dysplasia or cancer?",
        "When was the date of surgery for dysplasia or cancer? (format: YYYY-MM-DD)",
        Date,
    )
    .when(DYSPLASIA)
    .resolve(MostFrequent)
    .export(Identity),
    Def::new(
        "type_prior_dys",
        "Dysplasia Type",
        "What was the type of dysplasia?",
        "What is the type of dysplasia?",
        Label(NEOPLASIA_FINDINGS),
    )
    .when(DYSPLASIA)
    .resolve(MostRecent)
    .export(Code),
    Def::new(
        "sur_dys",
        "Dysplasia Surgery History",
        "Were any surgeries for dysplasia conducted at or prior to enrollment?",
        "Were any surgeries for dysplasia conducted at or prior to enrollment?",
        Boolean,
    )
    .when(DYSPLASIA)
    .resolve(AnyTrue)
    .export(Flag),
    // ── Primary sclerosing cholangitis ──
    Def::new(
        "psc_hx",
        "PSC History",
        "Does the patient have a history of Primary Sclerosing Cholangitis (PSC) at the time of enrollment?",
        "Does the patient have a history of Primary Sclerosing Cholangitis (PSC)?",
        Boolean,
    )
    .resolve(AnyTrue)
    .export(Flag),
    Def::new(
        "date_dgnsis_psc",
        "PSC Diagnosis Date",
        "What was the date of diagnosis for PSC?",
        "What was the date of diagnosis for PSC? (format: YYYY-MM-DD)",
        Date,
    )
    .when(PSC)
    .resolve(MostFrequent)
    .export(Identity),
    Def::new(
        "psc_dt_mt",
        "Date of First Encounter for PSC",
        "What was the date of the patient's first encounter for PSC?",
        "What was the date of the patient's first encounter for PSC? (format: YYYY-MM-DD)",
        Date,
    )
    .when(PSC)
    .resolve(EarliestDate)
    .export(Identity),
    Def::new(
        "psc_extent",
        "PSC Extent",
        "What is the extent of the PSC?",
        "What is the extent of the PSC?",
        Label(PSC_EXTENT),
    )
    .when(PSC)
    .resolve(MostRecent)
    .export(Code),
    Def::new(
        "psc_hx_chlgitis2",
        "PSC Cholangitis History",
        "Has the patient ever had a history of cholangitis?",
        "Has the patient ever had a history of cholangitis? (1=Never, 2=Once, 3=Two or more, 99=Unknown)",
        Label(EVENT_FREQUENCY),
    )
    .when(PSC)
    .resolve(MostRecent)
    .export(Code),
    Def::new(
        "psc_hx_bile",
        "PSC Bile Duct Stricture History",
        "Does the patient have a history of bile duct stricture?",
        "Does the patient have a history of bile duct stricture?",
        Boolean,
    )
    .when(PSC)
    .resolve(AnyTrue)
    .export(Flag),
    Def::new(
        "psc_hx_var_bled",
        "PSC Variceal Bleeding History",
        "Has the patient had a history of variceal bleeding?",
        "Has the patient had a history of variceal bleeding?",
        Boolean,
    )
    .when(PSC)
    .resolve(AnyTrue)
    .export(Flag),
    Def::new(
        "psc_hx_absc",
        "PSC Ascites History",
        "Does the patient have a history of ascites?",
        "Does the patient have a history of ascites?",
        Boolean,
    )
    .when(PSC)
    .resolve(AnyTrue)
    .export(Flag),
    Def::new(
        "psc_hx_sbp2",
        "PSC SBP History",
        "Does the patient have a history of Spontaneous Bacterial Peritonitis (SBP)?",
        "Does the patient have a history of SBP?",
        Boolean,
    )
    .when(PSC)
    .resolve(AnyTrue)
    .export(Flag),
    Def::new(
        "psc_hx_encl",
        "PSC Encephalopathy History",
        "Has there been any history of encephalopathy?",
        "Has there been any history of encephalopathy?",
        Boolean,
    )
    .when(PSC)
    .resolve(AnyTrue)
    .export(Flag),
    Def::new(
        "psc_hx_hcc2",
        "PSC HCC History",
        "Does the patient have a history of hepatocellular carcinoma (HCC)?",
        "Does the patient have a history of HCC?",
        Boolean,
    )
    .when(PSC)
    .resolve(AnyTrue)
    .export(Flag),
    Def::new(
        "psc_radiation",
        "PSC Radiation/RFA Treatment",
        "Has the patient received Radiation or Radiofrequency Ablation (RFA) treatment?",
        "Has the patient received Radiation or RFA treatment?",
        Boolean,
    )
    .when(PSC)
    .resolve(AnyTrue)
    .export(Flag),
    Def::new(
        "psc_cholcanc",
        "PSC Cholangiocarcinoma History",
        "What is the patient's history of cholangiocarcinoma?",
        "What is the patient's history of cholangiocarcinoma?",
        Boolean,
    )
    .when(PSC)
    .resolve(AnyTrue)
    .export(Flag),
    Def::new(
        "psc_cholcanc2",
        "PSC Cholangiocarcinoma Diagnosis Date",
        "What is the date of the cholangiocarcinoma diagnosis?",
        "What is the date of the cholangiocarcinoma diagnosis? (format: YYYY-MM-DD)",
        Date,
    )
    .when(PSC)
    .resolve(MostFrequent)
    .export(Identity),
    Def::new(
        "psc_hx_liv_trsn",
        "PSC Liver Transplant History",
        "What is the patient's history of liver transplant?",
        "What is the patient's history of liver transplant?",
        Boolean,
    )
    .when(PSC)
    .resolve(AnyTrue)
    .export(Flag),
    Def::new(
        "psc_olt_dt",
        "PSC OLT Date",
        "What is the date of the patient's OLT?",
        "What is the date of the patient's OLT? (format: YYYY-MM-DD)",
        Date,
    )
    .when(PSC)
    .resolve(MostFrequent)
    .export(Identity),
    Def::new(
        "psc_hx_liv_surg",
        "PSC Liver/Bile Duct Surgery History",
        "Does the patient have a history of liver or bile duct surgery?",
        "Does the patient have a history of liver or bile duct surgery?",
        Boolean,
    )
    .when(PSC)
    .resolve(AnyTrue)
    .export(Flag),
    Def::new(
        "psc_olt_dt2_d28",
        "PSC Liver/Bile Duct Surgery Date",
        "What was the date of the patient's liver or bile duct surgery?",
        "What was the date of the patient's liver or bile duct surgery? (format: YYYY-MM-DD)",
        Date,
    )
    .when(PSC)
    .resolve(MostFrequent)
    .export(Identity),
    Def::new(
        "psc_dialysis2",
        "PSC Dialysis Status",
        "Is the patient currently on dialysis?",
        "Is the patient currently on dialysis?",
        Boolean,
    )
    .when(PSC)
    .resolve(MostFrequent)
    .export(Flag),
];
