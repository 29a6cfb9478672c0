//! # Identifier Newtypes
//!
//! Every entity kind gets its own id type so references cannot be mixed up
//! (an `AssessmentId` never flows into a function expecting a `DataId`).

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// A user account.
    UserId
);
id_type!(
    /// An institution (instansi) - the tenant/ownership boundary.
    InstansiId
);
id_type!(
    /// A performance indicator.
    IndicatorId
);
id_type!(
    /// A yearly target for an indicator.
    TargetId
);
id_type!(
    /// A submitted performance-data record.
    DataId
);
id_type!(
    /// An evidence document attached to a performance-data record.
    EvidenceId
);
id_type!(
    /// An assessment of a performance-data record.
    AssessmentId
);
id_type!(
    /// A weighted criterion within an assessment.
    CriterionId
);
