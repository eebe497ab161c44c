//! Filtering for the public match board.
//!
//! Query values arrive exactly as the filter form sends them: selects use the
//! literal `"Todos"` for "no constraint" and empty inputs come through as empty
//! strings. [`MatchFilter`] holds that raw form and converts into
//! [`MatchCriteria`], which is what actually gets applied.

use anyhow::{anyhow, Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::{
    model::MatchModel,
    schema::{FieldType, Gender, MatchStatus},
};

const ANY: &str = "Todos";

pub const NEIGHBORHOODS: &[&str] = &[
    "Agronomía",
    "Almagro",
    "Balvanera",
    "Barracas",
    "Belgrano",
    "Boedo",
    "Caballito",
    "Chacarita",
    "Coghlan",
    "Colegiales",
    "Constitución",
    "Flores",
    "Floresta",
    "La Boca",
    "Liniers",
    "Mataderos",
    "Monserrat",
    "Monte Castro",
    "Nueva Pompeya",
    "Núñez",
    "Palermo",
    "Parque Avellaneda",
    "Parque Chacabuco",
    "Parque Chas",
    "Parque Patricios",
    "Paternal",
    "Recoleta",
    "Retiro",
    "Saavedra",
    "San Cristóbal",
    "San Nicolás",
    "San Telmo",
    "Vélez Sársfield",
    "Versalles",
    "Villa Crespo",
    "Villa del Parque",
    "Villa Devoto",
    "Villa General Mitre",
    "Villa Lugano",
    "Villa Luro",
    "Villa Ortúzar",
    "Villa Pueyrredón",
    "Villa Real",
    "Villa Riachuelo",
    "Villa Santa Rita",
    "Villa Soldati",
    "Villa Urquiza",
];

/// Keeps matches that are still open: scheduled after `now` and in the
/// `active` status. The store only filters by time, so status is checked here.
pub fn only_active(matches: Vec<MatchModel>, now: DateTime<Utc>) -> Vec<MatchModel> {
    matches
        .into_iter()
        .filter(|m| m.status == MatchStatus::Active && m.scheduled_at > now)
        .collect()
}

#[derive(Deserialize, Debug, Default)]
pub struct MatchFilter {
    pub field_type: Option<String>,
    pub neighborhood: Option<String>,
    pub gender: Option<String>,
    pub date: Option<String>,
    pub min_age: Option<String>,
    pub max_age: Option<String>,
}

#[derive(Debug, Default, PartialEq)]
pub struct MatchCriteria {
    pub field_type: Option<FieldType>,
    pub neighborhood: Option<String>,
    pub gender: Option<Gender>,
    pub date: Option<NaiveDate>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
}

fn selected(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != ANY)
}

impl TryFrom<MatchFilter> for MatchCriteria {
    type Error = Error;

    fn try_from(f: MatchFilter) -> Result<Self> {
        let field_type = selected(f.field_type)
            .map(|v| FieldType::try_from(v.as_str()))
            .transpose()?;
        let gender = selected(f.gender)
            .map(|v| Gender::try_from(v.as_str()))
            .transpose()?;
        let date = selected(f.date)
            .map(|v| {
                NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                    .map_err(|e| anyhow!("Invalid date {}: {}", v, e))
            })
            .transpose()?;
        let min_age = selected(f.min_age)
            .map(|v| v.parse::<i32>().map_err(|e| anyhow!("Invalid min_age {}: {}", v, e)))
            .transpose()?;
        let max_age = selected(f.max_age)
            .map(|v| v.parse::<i32>().map_err(|e| anyhow!("Invalid max_age {}: {}", v, e)))
            .transpose()?;

        Ok(Self {
            field_type,
            neighborhood: selected(f.neighborhood),
            gender,
            date,
            min_age,
            max_age,
        })
    }
}

impl MatchCriteria {
    /// The date compares against the organizer's local `match_date`, not the UTC
    /// instant. The age bounds compare against the match's own bounds: a
    /// minimum keeps matches whose `min_age` is at least that value, a maximum
    /// keeps matches whose `max_age` is at most that value.
    pub fn matches(&self, m: &MatchModel) -> bool {
        self.field_type.map_or(true, |ft| m.field_type == ft)
            && self
                .neighborhood
                .as_deref()
                .map_or(true, |n| m.neighborhood == n)
            && self.gender.map_or(true, |g| m.gender == g)
            && self.date.map_or(true, |d| m.match_date == d)
            && self.min_age.map_or(true, |age| m.min_age >= age)
            && self.max_age.map_or(true, |age| m.max_age <= age)
    }

    pub fn apply(&self, matches: Vec<MatchModel>) -> Vec<MatchModel> {
        matches.into_iter().filter(|m| self.matches(m)).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveTime, TimeZone};

    use super::*;
    use crate::model::tests::sample_match;

    #[test]
    fn only_active_drops_past_and_closed_matches() {
        let now = Utc::now();

        let open = sample_match();
        let mut past = sample_match();
        past.scheduled_at = now - Duration::minutes(1);
        let mut confirmed = sample_match();
        confirmed.status = MatchStatus::Confirmed;
        let mut cancelled = sample_match();
        cancelled.status = MatchStatus::Cancelled;
        let mut at_now = sample_match();
        at_now.scheduled_at = now;

        let kept = only_active(vec![past, open.clone(), confirmed, cancelled, at_now], now);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, open.id);
        assert!(kept
            .iter()
            .all(|m| m.status == MatchStatus::Active && m.scheduled_at > now));
    }

    #[test]
    fn only_active_keeps_order() {
        let now = Utc::now();
        let mut a = sample_match();
        a.scheduled_at = now + Duration::hours(1);
        let mut b = sample_match();
        b.scheduled_at = now + Duration::hours(5);

        let kept = only_active(vec![a.clone(), b.clone()], now);
        let ids: Vec<_> = kept.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[test]
    fn todos_and_blank_mean_no_constraint() {
        let criteria = MatchCriteria::try_from(MatchFilter {
            field_type: Some("Todos".to_string()),
            neighborhood: Some("Todos".to_string()),
            gender: Some("Todos".to_string()),
            date: Some(String::new()),
            min_age: Some("".to_string()),
            max_age: None,
        })
        .unwrap();

        assert_eq!(criteria, MatchCriteria::default());
        assert!(criteria.matches(&sample_match()));
    }

    #[test]
    fn parses_form_values() {
        let criteria = MatchCriteria::try_from(MatchFilter {
            field_type: Some("F11".to_string()),
            neighborhood: Some("Palermo".to_string()),
            gender: Some("Mujeres".to_string()),
            date: Some("2031-03-14".to_string()),
            min_age: Some("18".to_string()),
            max_age: Some(" 30 ".to_string()),
        })
        .unwrap();

        assert_eq!(criteria.field_type, Some(FieldType::F11));
        assert_eq!(criteria.neighborhood.as_deref(), Some("Palermo"));
        assert_eq!(criteria.gender, Some(Gender::Female));
        assert_eq!(criteria.date, NaiveDate::from_ymd_opt(2031, 3, 14));
        assert_eq!(criteria.min_age, Some(18));
        assert_eq!(criteria.max_age, Some(30));
    }

    #[test]
    fn rejects_unknown_values() {
        let bad_type = MatchFilter {
            field_type: Some("F9".to_string()),
            ..Default::default()
        };
        assert!(MatchCriteria::try_from(bad_type).is_err());

        let bad_age = MatchFilter {
            min_age: Some("veinte".to_string()),
            ..Default::default()
        };
        assert!(MatchCriteria::try_from(bad_age).is_err());

        let bad_date = MatchFilter {
            date: Some("14/03/2031".to_string()),
            ..Default::default()
        };
        assert!(MatchCriteria::try_from(bad_date).is_err());
    }

    #[test]
    fn filters_by_each_field() {
        let mut palermo_f5 = sample_match();
        palermo_f5.neighborhood = "Palermo".to_string();
        palermo_f5.field_type = FieldType::F5;
        palermo_f5.gender = Gender::Male;
        palermo_f5.match_date = NaiveDate::from_ymd_opt(2031, 3, 14).unwrap();
        palermo_f5.min_age = 18;
        palermo_f5.max_age = 30;

        let mut boedo_f11 = sample_match();
        boedo_f11.neighborhood = "Boedo".to_string();
        boedo_f11.field_type = FieldType::F11;
        boedo_f11.gender = Gender::Mixed;
        boedo_f11.match_date = NaiveDate::from_ymd_opt(2031, 3, 15).unwrap();
        boedo_f11.min_age = 16;
        boedo_f11.max_age = 50;

        let all = vec![palermo_f5.clone(), boedo_f11.clone()];
        let only = |criteria: MatchCriteria| -> Vec<_> {
            criteria.apply(all.clone()).into_iter().map(|m| m.id).collect()
        };

        assert_eq!(
            only(MatchCriteria {
                field_type: Some(FieldType::F11),
                ..Default::default()
            }),
            vec![boedo_f11.id]
        );
        assert_eq!(
            only(MatchCriteria {
                neighborhood: Some("Palermo".to_string()),
                ..Default::default()
            }),
            vec![palermo_f5.id]
        );
        assert_eq!(
            only(MatchCriteria {
                gender: Some(Gender::Mixed),
                ..Default::default()
            }),
            vec![boedo_f11.id]
        );
        assert_eq!(
            only(MatchCriteria {
                date: NaiveDate::from_ymd_opt(2031, 3, 14),
                ..Default::default()
            }),
            vec![palermo_f5.id]
        );
        assert_eq!(
            only(MatchCriteria {
                min_age: Some(18),
                ..Default::default()
            }),
            vec![palermo_f5.id]
        );
        assert_eq!(
            only(MatchCriteria {
                max_age: Some(40),
                ..Default::default()
            }),
            vec![palermo_f5.id]
        );
        assert!(only(MatchCriteria {
            neighborhood: Some("Palermo".to_string()),
            field_type: Some(FieldType::F11),
            ..Default::default()
        })
        .is_empty());
    }

    #[test]
    fn date_filter_uses_the_local_kickoff_date() {
        // 22:00 on the 14th in Buenos Aires is 01:00 on the 15th in UTC.
        let mut evening = sample_match();
        evening.scheduled_at = Utc.with_ymd_and_hms(2031, 3, 15, 1, 0, 0).unwrap();
        evening.match_date = NaiveDate::from_ymd_opt(2031, 3, 14).unwrap();
        evening.match_time = NaiveTime::from_hms_opt(22, 0, 0).unwrap();

        let on_day = |date: &str| {
            MatchCriteria::try_from(MatchFilter {
                date: Some(date.to_string()),
                ..Default::default()
            })
            .unwrap()
        };

        assert!(on_day("2031-03-14").matches(&evening));
        assert!(!on_day("2031-03-15").matches(&evening));
    }

    #[test]
    fn catalog_has_no_repeats() {
        let unique: std::collections::HashSet<_> = NEIGHBORHOODS.iter().collect();
        assert_eq!(unique.len(), NEIGHBORHOODS.len());
        assert!(NEIGHBORHOODS.contains(&"Villa Urquiza"));
    }
}
