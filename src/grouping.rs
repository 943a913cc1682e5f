//! Grouping resolution and the question-level overrides that run after it.

use log::debug;

use crate::columns::{GroupKey, Metric};
use crate::question::Question;

pub const SEX_TERMS: &[&str] = &["men", "women", "sex", "gender"];
pub const AGE_GROUP_PHRASES: &[&str] = &["by age", "age group", "age_bin"];

/// One row of the grouping rule table.
pub struct GroupingRule {
    /// Only applies when the detected metric is this one; `None` means any.
    pub metric: Option<Metric>,
    pub terms: &'static [&'static str],
    pub key: GroupKey,
}

/// Grouping rules. The first matching rule decides.
pub const GROUPING_RULES: &[GroupingRule] = &[
    GroupingRule {
        metric: None,
        terms: AGE_GROUP_PHRASES,
        key: GroupKey::AgeBin,
    },
    GroupingRule {
        metric: Some(Metric::HeartDiseaseRate),
        terms: SEX_TERMS,
        key: GroupKey::Sex,
    },
    GroupingRule {
        metric: Some(Metric::HeartDiseaseRate),
        terms: &["thal", "thalassemia"],
        key: GroupKey::Thalassemia,
    },
    GroupingRule {
        metric: Some(Metric::HeartDiseaseRate),
        terms: &["cp", "chest pain", "angina"],
        key: GroupKey::ChestPain,
    },
    GroupingRule {
        metric: Some(Metric::HeartDiseaseRate),
        terms: &["ca", "vessels", "blocked"],
        key: GroupKey::Vessels,
    },
];

impl GroupingRule {
    fn matches(&self, question: &Question, metric: Metric) -> bool {
        self.metric.map_or(true, |required| required == metric) && question.contains_any(self.terms)
    }
}

pub fn resolve_grouping(question: &Question, metric: Metric) -> Option<GroupKey> {
    GROUPING_RULES
        .iter()
        .find(|rule| rule.matches(question, metric))
        .map(|rule| rule.key)
}

/// What the pipeline will aggregate: a metric, optionally split by a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub metric: Metric,
    pub group: Option<GroupKey>,
}

/// A rewrite applied to the plan when the question contains a term from
/// both lists.
pub struct Override {
    pub name: &'static str,
    pub subject: &'static [&'static str],
    pub qualifier: &'static [&'static str],
    pub apply: fn(Plan) -> Plan,
}

/// Overrides, each checked on its own, in this order; a later one can undo an
/// earlier one.
pub const OVERRIDES: &[Override] = &[
    Override {
        name: "chest_pain_values",
        subject: &["chest pain", "cp"],
        qualifier: &["oldpeak", "st depression", "values"],
        apply: group_by_chest_pain,
    },
    Override {
        name: "sex_comparison",
        subject: SEX_TERMS,
        qualifier: &["more common", "compare", "comparison", "risk", "heart disease"],
        apply: disease_rate_by_sex,
    },
];

fn group_by_chest_pain(plan: Plan) -> Plan {
    Plan {
        group: Some(GroupKey::ChestPain),
        ..plan
    }
}

fn disease_rate_by_sex(_plan: Plan) -> Plan {
    Plan {
        metric: Metric::HeartDiseaseRate,
        group: Some(GroupKey::Sex),
    }
}

pub fn apply_overrides(question: &Question, mut plan: Plan) -> Plan {
    for rule in OVERRIDES {
        if question.contains_any(rule.subject) && question.contains_any(rule.qualifier) {
            plan = (rule.apply)(plan);
            debug!("override {} -> {:?}", rule.name, plan);
        }
    }
    plan
}

/// Grouping resolution followed by the overrides.
pub fn plan_for(question: &Question, metric: Metric) -> Plan {
    let group = resolve_grouping(question, metric);
    apply_overrides(question, Plan { metric, group })
}
