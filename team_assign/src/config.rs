// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The employment status of a participant.
///
/// The two statuses are treated asymmetrically: employees anchor the teams,
/// incoming hires fill them.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum EmploymentStatus {
    /// An established employee.
    Employee,
    /// An incoming hire (offer accepted, not started yet).
    Incoming,
}

/// A participant, as registered for the assignment.
///
/// `org` is expected to be the normalized organization abbreviation and `id`
/// a stable identifier. Neither is interpreted beyond equality.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Member {
    pub id: String,
    pub org: String,
    pub status: EmploymentStatus,
}

// ******** Output data structures *********

/// One team of one round.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Team {
    pub id: String,
    /// Set for round-2 teams, which are single-organization by construction.
    pub org: Option<String>,
    pub employee_count: u32,
    /// Member ids, the anchoring employee first when there is one.
    pub members: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AssignmentResult {
    pub round1: Vec<Team>,
    pub round2: Vec<Team>,
    /// Members that could not be placed in a full round-1 team. Round 2
    /// always covers everyone.
    pub unassigned: Vec<String>,
}

/// Errors that prevent the algorithm from completing successfully.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AssignmentErrors {
    EmptyRoster,
    DuplicateMember,
    InvalidRules,
}

impl Error for AssignmentErrors {}

impl Display for AssignmentErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignmentErrors::EmptyRoster => write!(f, "the roster is empty"),
            AssignmentErrors::DuplicateMember => write!(f, "a member id appears twice"),
            AssignmentErrors::InvalidRules => write!(f, "the assignment rules are inconsistent"),
        }
    }
}

// ********* Configuration **********

/// The rules that govern both rounds of the assignment.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct AssignmentRules {
    /// Number of members in a full team.
    pub team_size: u32,
    /// Incoming hires taken from the anchoring employee's own organization
    /// before other organizations are considered (round 1).
    pub home_incoming_count: u32,
    /// Incoming hires attached per organization on each pass over the other
    /// organizations (round 1).
    pub attach_batch_size: u32,
    /// Seed of the deterministic shuffles. The same roster and seed always
    /// produce the same assignment.
    pub shuffle_seed: u32,
}

impl AssignmentRules {
    pub const DEFAULT_RULES: AssignmentRules = AssignmentRules {
        team_size: 6,
        home_incoming_count: 2,
        attach_batch_size: 2,
        shuffle_seed: 42,
    };
}
