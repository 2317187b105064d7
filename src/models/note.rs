//! Source records: clinical notes and patient demographics.

use serde::{Deserialize, Serialize};

use super::partial_date::PartialDate;

pub type NoteId = i64;

/// One clinical note as exported from the EHR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalNote {
    pub id: NoteId,
    pub patient_id: String,
    /// Note date as written in the source export (ISO or US form).
    pub date: String,
    pub text: String,
}

impl ClinicalNote {
    pub fn new(id: NoteId, patient_id: &str, date: &str, text: &str) -> Self {
        Self {
            id,
            patient_id: patient_id.to_string(),
            date: date.to_string(),
            text: text.to_string(),
        }
    }

    pub fn partial_date(&self) -> Option<PartialDate> {
        PartialDate::parse(&self.date)
    }
}

/// Demographics carried through to the exported patient record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientMeta {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Date of birth in `YYYY-MM-DD` form.
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
}

impl PatientMeta {
    /// Prompt tag giving the model the patient's date of birth, so that
    /// ages mentioned in notes can be turned into dates.
    pub fn prompt_tag(&self) -> String {
        match &self.date_of_birth {
            Some(dob) => format!("<patient DoB=\"{dob}\"/>"),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_tag_carries_date_of_birth() {
        let meta = PatientMeta {
            date_of_birth: Some("1970-04-02".into()),
            ..Default::default()
        };
        assert_eq!(meta.prompt_tag(), "<patient DoB=\"1970-04-02\"/>");
        assert_eq!(PatientMeta::default().prompt_tag(), "");
    }

    #[test]
    fn note_date_parses_as_partial_date() {
        let note = ClinicalNote::new(1, "p1", "2021-05", "text");
        assert_eq!(note.partial_date(), Some(PartialDate::year_month(2021, 5)));
        let bad = ClinicalNote::new(2, "p1", "unknown", "text");
        assert_eq!(bad.partial_date(), None);
    }
}
