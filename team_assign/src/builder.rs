pub use crate::config::*;

/// A builder for registering members one at a time.
///
/// ```
/// pub use team_assign::builder::Builder;
/// pub use team_assign::{AssignmentRules, EmploymentStatus};
/// # use team_assign::AssignmentErrors;
///
/// let mut builder = Builder::new(&AssignmentRules::DEFAULT_RULES)?;
///
/// builder.add_member("ACME_EMP_0001", "ACME", EmploymentStatus::Employee)?;
/// builder.add_member("ACME_NEW_0001", "ACME", EmploymentStatus::Incoming)?;
///
/// # Ok::<(), AssignmentErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: AssignmentRules,
    pub(crate) _members: Vec<Member>,
}

impl Builder {
    pub fn new(rules: &AssignmentRules) -> Result<Builder, AssignmentErrors> {
        Ok(Builder {
            _rules: *rules,
            _members: Vec::new(),
        })
    }

    /// Registers a member. Duplicates are only detected when running the
    /// assignment.
    pub fn add_member(
        &mut self,
        id: &str,
        org: &str,
        status: EmploymentStatus,
    ) -> Result<(), AssignmentErrors> {
        self.add_member_2(&Member {
            id: id.to_string(),
            org: org.to_string(),
            status,
        })
    }

    pub fn add_member_2(&mut self, member: &Member) -> Result<(), AssignmentErrors> {
        self._members.push(member.clone());
        Ok(())
    }

    /// Runs the assignment over the registered members.
    pub fn run(&self) -> Result<AssignmentResult, AssignmentErrors> {
        crate::run_assignment(&self._members, &self._rules)
    }
}
