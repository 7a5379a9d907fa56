use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Client-writable columns of an analysis. Anything else in a request body
/// (`id`, `id_user`, timestamps) is dropped during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct AnalysisFields {
    pub year: Option<i32>,
    pub semester: Option<i32>,
    pub subject: Option<String>,
    pub id_group: Option<String>,
    pub id_department: Option<String>,
    pub count_stud: Option<i32>,
    pub count5: Option<i32>,
    pub count4: Option<i32>,
    pub count3: Option<i32>,
    pub count2: Option<i32>,
    pub count_passed: Option<i32>,
    pub count_released: Option<i32>,
    pub count_not_cert: Option<i32>,
    pub count_acad_leave: Option<i32>,
    pub count_expelled: Option<i32>,
    pub quality: Option<f64>,
    pub overall: Option<f64>,
    pub average: Option<f64>,
}

macro_rules! overlay {
    ($dst:expr, $src:expr, $($field:ident),+ $(,)?) => {
        $( if $src.$field.is_some() { $dst.$field = $src.$field; } )+
    };
}

impl AnalysisFields {
    /// Overwrites every field that is set in `patch`; unset fields keep their value.
    pub fn apply(&mut self, patch: AnalysisFields) {
        overlay!(
            self, patch,
            year, semester, subject, id_group, id_department,
            count_stud, count5, count4, count3, count2,
            count_passed, count_released, count_not_cert, count_acad_leave, count_expelled,
            quality, overall, average,
        );
    }
}

/// Analysis record in the `analysis` table.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Analysis {
    pub id: i32,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub fields: AnalysisFields,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(rename = "updatedAt", with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub id_user: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_only_overwrites_present_fields() {
        let mut current = AnalysisFields {
            year: Some(2024),
            semester: Some(1),
            subject: Some("Math".into()),
            count5: Some(7),
            ..Default::default()
        };
        current.apply(AnalysisFields {
            semester: Some(2),
            quality: Some(81.25),
            ..Default::default()
        });
        assert_eq!(current.year, Some(2024));
        assert_eq!(current.semester, Some(2));
        assert_eq!(current.subject.as_deref(), Some("Math"));
        assert_eq!(current.count5, Some(7));
        assert_eq!(current.quality, Some(81.25));
    }

    #[test]
    fn body_cannot_carry_owner_or_id() {
        let fields: AnalysisFields = serde_json::from_value(serde_json::json!({
            "id": 77,
            "id_user": 999,
            "year": 2024,
            "subject": "Physics"
        }))
        .unwrap();
        assert_eq!(fields.year, Some(2024));
        assert_eq!(fields.subject.as_deref(), Some("Physics"));
        let back = serde_json::to_value(&fields).unwrap();
        assert!(back.get("id_user").is_none());
    }
}
