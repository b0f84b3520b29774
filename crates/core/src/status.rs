//! Status enums mapping to the TEXT status columns.
//!
//! Each variant's string is the exact value stored in the database, so the
//! enums can sit at the storage boundary without a lookup table.

/// A status column held a value no enum variant maps to.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} value: '{value}'")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Return the value stored in the status column.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $val ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $val => Ok($name::$variant), )+
                    other => Err(UnknownStatus {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

define_status_enum! {
    /// Project lifecycle status.
    ProjectStatus {
        /// Open for submissions (the "active" state).
        Booking = "booking",
        /// Casting closed.
        Booked = "booked",
        Archived = "archived",
    }
}

define_status_enum! {
    /// Role lifecycle status.
    RoleStatus {
        Booking = "booking",
        Booked = "booked",
        Archived = "archived",
    }
}

define_status_enum! {
    /// Legacy booking status.
    BookingStatus {
        Pending = "pending",
        Confirmed = "confirmed",
        Completed = "completed",
        Cancelled = "cancelled",
    }
}

define_status_enum! {
    /// Submission review status. A NULL column means new / unreviewed and is
    /// modelled as `Option::None`.
    SubmissionStatus {
        Pinned = "pinned",
        Booked = "booked",
        Rejected = "rejected",
        Selected = "selected",
        Archived = "archived",
    }
}

impl SubmissionStatus {
    /// Statuses a reviewer may set directly. `selected` and `archived` are
    /// only written by the archive and restore cascades.
    pub fn is_review_decision(self) -> bool {
        matches!(
            self,
            SubmissionStatus::Pinned | SubmissionStatus::Booked | SubmissionStatus::Rejected
        )
    }
}

impl ProjectStatus {
    /// Whether the project state machine allows moving from `self` to `target`.
    ///
    /// `booking <-> booked`, either of those to `archived`, and `archived`
    /// back to `booking` only. Self-transitions are allowed and idempotent.
    pub fn can_transition_to(self, target: ProjectStatus) -> bool {
        use ProjectStatus::*;
        matches!(
            (self, target),
            (Booking, Booking)
                | (Booked, Booked)
                | (Archived, Archived)
                | (Booking, Booked)
                | (Booked, Booking)
                | (Booking, Archived)
                | (Booked, Archived)
                | (Archived, Booking)
        )
    }

    /// The state a restored project returns to, whatever it was before archival.
    pub fn restored() -> Self {
        ProjectStatus::Booking
    }
}

impl RoleStatus {
    pub fn is_archived(self) -> bool {
        self == RoleStatus::Archived
    }
}

/// Parse a nullable submission status column.
pub fn parse_submission_status(
    raw: Option<&str>,
) -> Result<Option<SubmissionStatus>, UnknownStatus> {
    match raw {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some),
    }
}
