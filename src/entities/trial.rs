use std::fmt::Debug;
use std::marker::PhantomData;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::config::Config;
use crate::entities::QueryParams;
use crate::error::PharmaError;
use crate::sources::clinicaltrials::{ClinicalTrialsClient, RegistryField};

/// A closed set of registry values for one [`RegistryField`].
pub trait FieldLabel: Copy + PartialEq + Debug + 'static {
    const FIELD: RegistryField;
    /// Every label, in display order.
    const ALL: &'static [Self];

    /// The exact string the registry reports for this label.
    fn label(self) -> &'static str;

    /// Position of this label in [`FieldLabel::ALL`].
    fn index(self) -> usize;

    fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.label() == label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialStatus {
    NotYetRecruiting,
    Recruiting,
    EnrollingByInvitation,
    ActiveNotRecruiting,
    Suspended,
    Terminated,
    Completed,
    Withdrawn,
    UnknownStatus,
}

impl FieldLabel for TrialStatus {
    const FIELD: RegistryField = RegistryField::OverallStatus;
    const ALL: &'static [Self] = &[
        Self::NotYetRecruiting,
        Self::Recruiting,
        Self::EnrollingByInvitation,
        Self::ActiveNotRecruiting,
        Self::Suspended,
        Self::Terminated,
        Self::Completed,
        Self::Withdrawn,
        Self::UnknownStatus,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn label(self) -> &'static str {
        match self {
            Self::NotYetRecruiting => "Not yet recruiting",
            Self::Recruiting => "Recruiting",
            Self::EnrollingByInvitation => "Enrolling by invitation",
            Self::ActiveNotRecruiting => "Active, not recruiting",
            Self::Suspended => "Suspended",
            Self::Terminated => "Terminated",
            Self::Completed => "Completed",
            Self::Withdrawn => "Withdrawn",
            Self::UnknownStatus => "Unknown status",
        }
    }
}

/// Lead sponsor class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizerClass {
    Fed,
    Indiv,
    Industry,
    Network,
    Nih,
    Other,
    OtherGov,
}

impl FieldLabel for OrganizerClass {
    const FIELD: RegistryField = RegistryField::OrgClass;
    const ALL: &'static [Self] = &[
        Self::Fed,
        Self::Indiv,
        Self::Industry,
        Self::Network,
        Self::Nih,
        Self::Other,
        Self::OtherGov,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn label(self) -> &'static str {
        match self {
            Self::Fed => "FED",
            Self::Indiv => "INDIV",
            Self::Industry => "INDUSTRY",
            Self::Network => "NETWORK",
            Self::Nih => "NIH",
            Self::Other => "OTHER",
            Self::OtherGov => "OTHER_GOV",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialPhase {
    EarlyPhase1,
    NotApplicable,
    Phase1,
    Phase2,
    Phase3,
    Phase4,
}

impl FieldLabel for TrialPhase {
    const FIELD: RegistryField = RegistryField::Phase;
    const ALL: &'static [Self] = &[
        Self::EarlyPhase1,
        Self::NotApplicable,
        Self::Phase1,
        Self::Phase2,
        Self::Phase3,
        Self::Phase4,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn label(self) -> &'static str {
        match self {
            Self::EarlyPhase1 => "Early Phase 1",
            Self::NotApplicable => "Not Applicable",
            Self::Phase1 => "Phase 1",
            Self::Phase2 => "Phase 2",
            Self::Phase3 => "Phase 3",
            Self::Phase4 => "Phase 4",
        }
    }
}

/// Trial counts keyed by every label of `L`; absent labels read as 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCounts<L: FieldLabel> {
    counts: Vec<u64>,
    _label: PhantomData<L>,
}

impl<L: FieldLabel> Default for FieldCounts<L> {
    fn default() -> Self {
        Self {
            counts: vec![0; L::ALL.len()],
            _label: PhantomData,
        }
    }
}

impl<L: FieldLabel> FieldCounts<L> {
    pub fn get(&self, label: L) -> u64 {
        self.counts[label.index()]
    }

    pub(crate) fn set(&mut self, label: L, count: u64) {
        self.counts[label.index()] = count;
    }

    pub fn iter(&self) -> impl Iterator<Item = (L, u64)> + '_ {
        L::ALL.iter().copied().zip(self.counts.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

impl<L: FieldLabel> Serialize for FieldCounts<L> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (label, count) in self.iter() {
            map.serialize_entry(label.label(), &count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct TrialSummary {
    pub n_trials: u64,
    pub status: FieldCounts<TrialStatus>,
    pub organizers: FieldCounts<OrganizerClass>,
    pub phases: FieldCounts<TrialPhase>,
}

/// Runs the three field-value queries and folds them into a [`TrialSummary`].
///
/// Queries run one after another. The total trial count is taken from the
/// status query.
pub async fn fetch_trial_summary(
    client: &ClinicalTrialsClient,
    params: &QueryParams,
) -> Result<TrialSummary, PharmaError> {
    let expr = crate::utils::query::registry_expression(params.drug(), params.disease());

    let status = client
        .field_values(&expr, params.cutoff(), TrialStatus::FIELD)
        .await?;
    let organizers = client
        .field_values(&expr, params.cutoff(), OrganizerClass::FIELD)
        .await?;
    let phases = client
        .field_values(&expr, params.cutoff(), TrialPhase::FIELD)
        .await?;

    Ok(TrialSummary {
        n_trials: status.n_studies_found,
        status: crate::transform::trial::fold_field_values(&status.field_values),
        organizers: crate::transform::trial::fold_field_values(&organizers.field_values),
        phases: crate::transform::trial::fold_field_values(&phases.field_values),
    })
}

/// Convenience entry point building the client from `config`.
pub async fn trial_summary(
    config: &Config,
    params: &QueryParams,
) -> Result<TrialSummary, PharmaError> {
    let client = ClinicalTrialsClient::new(config)?;
    fetch_trial_summary(&client, params).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn field_response(total: u64, values: &[(&str, u64)]) -> ResponseTemplate {
        let values: Vec<serde_json::Value> = values
            .iter()
            .map(|(label, n)| {
                serde_json::json!({"FieldValue": label, "NStudiesFoundWithValue": n})
            })
            .collect();
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "FieldValuesResponse": {"NStudiesFound": total, "FieldValues": values}
        }))
    }

    async fn mount_field(server: &MockServer, field: &str, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/api/query/field_values"))
            .and(query_param("field", field))
            .respond_with(template)
            .expect(1)
            .mount(server)
            .await;
    }

    fn config_for(server: &MockServer) -> Config {
        Config {
            ctgov_base: Cow::Owned(server.uri()),
            ..Config::default()
        }
    }

    #[test]
    fn label_sets_have_expected_sizes() {
        assert_eq!(TrialStatus::ALL.len(), 9);
        assert_eq!(OrganizerClass::ALL.len(), 7);
        assert_eq!(TrialPhase::ALL.len(), 6);
    }

    fn assert_index_matches_position<L: FieldLabel>() {
        for (position, label) in L::ALL.iter().enumerate() {
            assert_eq!(label.index(), position, "{label:?}");
        }
    }

    #[test]
    fn label_index_matches_display_order() {
        assert_index_matches_position::<TrialStatus>();
        assert_index_matches_position::<OrganizerClass>();
        assert_index_matches_position::<TrialPhase>();
    }

    #[test]
    fn set_counts_land_on_their_own_label() {
        let mut counts = FieldCounts::<TrialPhase>::default();
        counts.set(TrialPhase::Phase4, 5);
        counts.set(TrialPhase::EarlyPhase1, 2);
        assert_eq!(counts.get(TrialPhase::Phase4), 5);
        assert_eq!(counts.get(TrialPhase::EarlyPhase1), 2);
        assert_eq!(counts.get(TrialPhase::Phase1), 0);
        assert_eq!(counts.total(), 7);
    }

    #[test]
    fn from_label_is_exact_match() {
        assert_eq!(
            TrialStatus::from_label("Active, not recruiting"),
            Some(TrialStatus::ActiveNotRecruiting)
        );
        assert_eq!(TrialStatus::from_label("recruiting"), None);
        assert_eq!(OrganizerClass::from_label("OTHER_GOV"), Some(OrganizerClass::OtherGov));
        assert_eq!(TrialPhase::from_label("Phase 2/Phase 3"), None);
    }

    #[test]
    fn default_counts_serialize_every_label_as_zero() {
        let json = serde_json::to_value(TrialSummary::default()).unwrap();
        let status = json["status"].as_object().unwrap();
        assert_eq!(status.len(), 9);
        assert!(status.values().all(|v| v == 0));
        assert_eq!(json["organizers"].as_object().unwrap().len(), 7);
        assert_eq!(json["phases"].as_object().unwrap().len(), 6);
        assert_eq!(json["phases"]["Early Phase 1"], 0);
        assert_eq!(json["n_trials"], 0);
    }

    #[tokio::test]
    async fn fetch_trial_summary_fills_fixed_keys() {
        let server = MockServer::start().await;
        mount_field(
            &server,
            "OverallStatus",
            field_response(
                12,
                &[
                    ("Completed", 7),
                    ("Recruiting", 3),
                    ("Unknown status", 1),
                    ("Available", 1),
                ],
            ),
        )
        .await;
        mount_field(
            &server,
            "OrgClass",
            field_response(12, &[("INDUSTRY", 8), ("OTHER", 4), ("UNKNOWN", 2)]),
        )
        .await;
        mount_field(
            &server,
            "Phase",
            field_response(12, &[("Phase 3", 6), ("Phase 4", 2), ("Phase 2/Phase 3", 1)]),
        )
        .await;

        let params = QueryParams::parse("rivaroxaban", "pulmonary embolism", "2019-01-01").unwrap();
        let summary = trial_summary(&config_for(&server), &params).await.unwrap();

        assert_eq!(summary.n_trials, 12);
        assert_eq!(summary.status.len(), 9);
        assert_eq!(summary.status.get(TrialStatus::Completed), 7);
        assert_eq!(summary.status.get(TrialStatus::Recruiting), 3);
        assert_eq!(summary.status.get(TrialStatus::Withdrawn), 0);
        assert_eq!(summary.status.total(), 11);
        assert_eq!(summary.organizers.len(), 7);
        assert_eq!(summary.organizers.get(OrganizerClass::Industry), 8);
        assert_eq!(summary.organizers.get(OrganizerClass::Nih), 0);
        assert_eq!(summary.phases.len(), 6);
        assert_eq!(summary.phases.get(TrialPhase::Phase3), 6);
        assert_eq!(summary.phases.total(), 8);
    }

    #[tokio::test]
    async fn fetch_trial_summary_zero_matches_is_all_zero() {
        let server = MockServer::start().await;
        for field in ["OverallStatus", "OrgClass", "Phase"] {
            mount_field(&server, field, field_response(0, &[])).await;
        }

        let params = QueryParams::parse("nothing", "nowhere", "2001-01-01").unwrap();
        let summary = trial_summary(&config_for(&server), &params).await.unwrap();
        assert_eq!(summary, TrialSummary::default());
    }

    #[tokio::test]
    async fn fetch_trial_summary_fails_on_malformed_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/query/field_values"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "FieldValuesResponse": {"FieldValues": []}
            })))
            .mount(&server)
            .await;

        let params = QueryParams::parse("a", "b", "2019").unwrap();
        let err = trial_summary(&config_for(&server), &params)
            .await
            .unwrap_err();
        assert!(matches!(err, PharmaError::ApiJson { .. }));
    }
}
