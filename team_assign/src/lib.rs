pub mod builder;
mod config;
use log::{debug, info, warn};

use std::collections::{BTreeMap, HashSet};

pub use crate::config::*;

// **** Private structures ****

/// Index of a member in the input slice.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct MemberIx(u32);

impl MemberIx {
    fn get<'a>(&self, members: &'a [Member]) -> &'a Member {
        &members[self.0 as usize]
    }
}

/// Runs the two-round assignment with the given rules for the given members.
///
/// Arguments:
/// * `members` the registered participants, already filtered to the confirmed
///   ones and carrying normalized organization abbreviations
/// * `rules` the rules that govern the assignment
///
/// Round 1 builds mixed-organization teams of exactly `rules.team_size`
/// members; participants left over from an under-full team are reported in
/// `AssignmentResult::unassigned`. Round 2 builds single-organization teams
/// and covers every participant.
pub fn run_assignment(
    members: &[Member],
    rules: &config::AssignmentRules,
) -> Result<AssignmentResult, AssignmentErrors> {
    info!(
        "Processing {:?} members, rules: {:?}",
        members.len(),
        rules
    );

    if members.is_empty() {
        return Err(AssignmentErrors::EmptyRoster);
    }
    let mut seen_ids: HashSet<&str> = HashSet::new();
    for m in members.iter() {
        if !seen_ids.insert(m.id.as_str()) {
            warn!("Duplicate member id: {}", m.id);
            return Err(AssignmentErrors::DuplicateMember);
        }
    }
    validate_rules(rules)?;

    {
        let mut counts: BTreeMap<(&str, EmploymentStatus), usize> = BTreeMap::new();
        for m in members.iter() {
            *counts.entry((m.org.as_str(), m.status)).or_insert(0) += 1;
        }
        for ((org, status), count) in counts.iter() {
            info!("Participants: {} {:?}: {}", org, status, count);
        }
    }

    let (round1, unassigned) = assign_round1(members, rules);
    let round2 = assign_round2(members, rules);

    let unassigned_ids: Vec<String> = unassigned
        .iter()
        .map(|ix| ix.get(members).id.clone())
        .collect();
    for id in unassigned_ids.iter() {
        warn!("Round 1: member {} could not be placed in a full team", id);
    }

    Ok(AssignmentResult {
        round1,
        round2,
        unassigned: unassigned_ids,
    })
}

fn validate_rules(rules: &AssignmentRules) -> Result<(), AssignmentErrors> {
    if rules.team_size < 2 || rules.attach_batch_size == 0 {
        return Err(AssignmentErrors::InvalidRules);
    }
    // The anchoring employee and the home picks must fit in one team.
    if rules.home_incoming_count + 1 > rules.team_size {
        return Err(AssignmentErrors::InvalidRules);
    }
    Ok(())
}

/// Deterministic stand-in for a shuffle: members sort by the digest of their
/// id keyed by the seed and a scope label, so the two partitions (and the two
/// rounds) get independent permutations.
fn seeded_permutation(
    members: &[Member],
    ixs: &[MemberIx],
    seed: u32,
    scope: &str,
) -> Vec<MemberIx> {
    let mut keyed: Vec<(String, MemberIx)> = ixs
        .iter()
        .map(|&ix| {
            let key = format!("{:08}:{}:{}", seed, scope, ix.get(members).id);
            (sha256::digest(key), ix)
        })
        .collect();
    keyed.sort();
    keyed.into_iter().map(|p| p.1).collect()
}

/// Deterministic walk order over the non-home organizations for one team.
fn org_permutation(orgs: &[String], seed: u32, team_ordinal: u32) -> Vec<String> {
    let mut keyed: Vec<(String, String)> = orgs
        .iter()
        .map(|org| {
            let key = format!("{:08}:{:08}:{}", seed, team_ordinal, org);
            (sha256::digest(key), org.clone())
        })
        .collect();
    keyed.sort();
    keyed.into_iter().map(|p| p.1).collect()
}

fn group_by_org(members: &[Member], ixs: &[MemberIx]) -> BTreeMap<String, Vec<MemberIx>> {
    let mut res: BTreeMap<String, Vec<MemberIx>> = BTreeMap::new();
    for &ix in ixs.iter() {
        res.entry(ix.get(members).org.clone()).or_default().push(ix);
    }
    res
}

/// Pops up to `want` members from the given organization pool.
fn take_from(
    by_org: &BTreeMap<String, Vec<MemberIx>>,
    cursors: &mut BTreeMap<String, usize>,
    org: &str,
    want: usize,
    out: &mut Vec<MemberIx>,
) -> usize {
    let pool = match by_org.get(org) {
        Some(p) => p,
        None => return 0,
    };
    let cursor = cursors.entry(org.to_string()).or_insert(0);
    let available = pool.len() - *cursor;
    let taken = want.min(available);
    out.extend(&pool[*cursor..*cursor + taken]);
    *cursor += taken;
    taken
}

fn member_ids(members: &[Member], ixs: &[MemberIx]) -> Vec<String> {
    ixs.iter().map(|ix| ix.get(members).id.clone()).collect()
}

/// Round 1: mixed-organization teams.
///
/// Every emitted team has exactly `rules.team_size` members and at most one
/// employee. Members consumed by a team that cannot reach full size are
/// returned as unassigned rather than silently dropped.
fn assign_round1(members: &[Member], rules: &AssignmentRules) -> (Vec<Team>, Vec<MemberIx>) {
    let seed = rules.shuffle_seed;
    let employees: Vec<MemberIx> = (0..members.len() as u32)
        .map(MemberIx)
        .filter(|ix| ix.get(members).status == EmploymentStatus::Employee)
        .collect();
    let incoming: Vec<MemberIx> = (0..members.len() as u32)
        .map(MemberIx)
        .filter(|ix| ix.get(members).status == EmploymentStatus::Incoming)
        .collect();

    let employees = seeded_permutation(members, &employees, seed, "r1-employees");
    let incoming = seeded_permutation(members, &incoming, seed, "r1-incoming");

    let emp_by_org = group_by_org(members, &employees);
    let inc_by_org = group_by_org(members, &incoming);
    let mut cursors: BTreeMap<String, usize> = BTreeMap::new();

    let team_size = rules.team_size as usize;
    let needed = team_size - 1;

    let mut teams: Vec<Team> = Vec::new();
    let mut unassigned: Vec<MemberIx> = Vec::new();
    // Counts opened teams, emitted or not, so the walk order of a team does
    // not depend on the fate of the previous ones.
    let mut opened: u32 = 0;

    for (org, emps) in emp_by_org.iter() {
        for &emp in emps.iter() {
            opened += 1;
            let mut attached: Vec<MemberIx> = Vec::new();

            // The employee's own organization contributes first.
            take_from(
                &inc_by_org,
                &mut cursors,
                org,
                (rules.home_incoming_count as usize).min(needed),
                &mut attached,
            );

            // Then walk the other organizations, a batch at a time, until the
            // team is full or every pool is dry.
            let others: Vec<String> = inc_by_org
                .keys()
                .filter(|o| o.as_str() != org.as_str())
                .cloned()
                .collect();
            let others = org_permutation(&others, seed, opened);
            let mut progressed = true;
            while attached.len() < needed && progressed {
                progressed = false;
                for other in others.iter() {
                    if attached.len() >= needed {
                        break;
                    }
                    let want = (rules.attach_batch_size as usize).min(needed - attached.len());
                    if take_from(&inc_by_org, &mut cursors, other, want, &mut attached) > 0 {
                        progressed = true;
                    }
                }
            }

            debug!(
                "Round 1: team {} for employee {}: attached {:?}",
                opened,
                emp.get(members).id,
                member_ids(members, &attached)
            );

            if attached.len() == needed {
                let mut ixs = vec![emp];
                ixs.extend(&attached);
                teams.push(Team {
                    id: format!("R1-{:02}", teams.len() + 1),
                    org: None,
                    employee_count: 1,
                    members: member_ids(members, &ixs),
                });
            } else {
                unassigned.push(emp);
                unassigned.extend(&attached);
            }
        }
    }

    // Batch the remaining incoming hires into uniform teams.
    let mut remaining: Vec<MemberIx> = Vec::new();
    for (org, pool) in inc_by_org.iter() {
        let cursor = cursors.get(org).cloned().unwrap_or(0);
        remaining.extend(&pool[cursor..]);
    }
    for chunk in remaining.chunks(team_size) {
        if chunk.len() == team_size {
            teams.push(Team {
                id: format!("R1-{:02}", teams.len() + 1),
                org: None,
                employee_count: 0,
                members: member_ids(members, chunk),
            });
        } else {
            unassigned.extend(chunk);
        }
    }

    (teams, unassigned)
}

/// Round 2: single-organization teams. Every participant is covered, short
/// final teams included.
fn assign_round2(members: &[Member], rules: &AssignmentRules) -> Vec<Team> {
    let seed = rules.shuffle_seed;
    let all: Vec<MemberIx> = (0..members.len() as u32).map(MemberIx).collect();
    let by_org = group_by_org(members, &all);

    let team_size = rules.team_size as usize;
    let mut teams: Vec<Team> = Vec::new();

    for (org, group) in by_org.iter() {
        let shuffled = seeded_permutation(members, group, seed, &format!("r2-{}", org));
        let emps: Vec<MemberIx> = shuffled
            .iter()
            .cloned()
            .filter(|ix| ix.get(members).status == EmploymentStatus::Employee)
            .collect();
        let incs: Vec<MemberIx> = shuffled
            .iter()
            .cloned()
            .filter(|ix| ix.get(members).status == EmploymentStatus::Incoming)
            .collect();

        let mut count = 1;

        // Employee-anchored teams take consecutive blocks of incoming hires.
        for (i, &emp) in emps.iter().enumerate() {
            let start = (i * team_size).min(incs.len());
            let end = (start + team_size).min(incs.len());
            let mut ixs = vec![emp];
            ixs.extend(&incs[start..end]);
            teams.push(Team {
                id: format!("R2-{}{}", org, count),
                org: Some(org.clone()),
                employee_count: 1,
                members: member_ids(members, &ixs),
            });
            count += 1;
        }

        // Remaining incoming hires, short final team kept.
        let mut i = (emps.len() * team_size).min(incs.len());
        while i < incs.len() {
            let end = (i + team_size).min(incs.len());
            teams.push(Team {
                id: format!("R2-{}{}", org, count),
                org: Some(org.clone()),
                employee_count: 0,
                members: member_ids(members, &incs[i..end]),
            });
            count += 1;
            i = end;
        }
    }

    teams
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn mk(org: &str, status: EmploymentStatus, n: usize, out: &mut Vec<Member>) {
        for _ in 0..n {
            let seq = out.iter().filter(|m| m.org == org).count() + 1;
            let tag = match status {
                EmploymentStatus::Employee => "EMP",
                EmploymentStatus::Incoming => "NEW",
            };
            out.push(Member {
                id: format!("{}_{}_{:04}", org, tag, seq),
                org: org.to_string(),
                status,
            });
        }
    }

    fn three_org_roster() -> Vec<Member> {
        let mut members = Vec::new();
        mk("AAA", EmploymentStatus::Employee, 2, &mut members);
        mk("AAA", EmploymentStatus::Incoming, 10, &mut members);
        mk("BBB", EmploymentStatus::Employee, 1, &mut members);
        mk("BBB", EmploymentStatus::Incoming, 10, &mut members);
        mk("CCC", EmploymentStatus::Incoming, 7, &mut members);
        members
    }

    fn membership_counts(teams: &[Team]) -> HashMap<String, usize> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for t in teams.iter() {
            for m in t.members.iter() {
                *counts.entry(m.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    #[test]
    fn round1_full_teams_cover_everyone_or_report() {
        let members = three_org_roster();
        let res = run_assignment(&members, &AssignmentRules::DEFAULT_RULES).unwrap();

        // 3 employee-anchored teams consume 15 incoming hires; the remaining
        // 12 batch into 2 uniform teams.
        assert_eq!(res.round1.len(), 5);
        assert!(res.unassigned.is_empty());
        for t in res.round1.iter() {
            assert_eq!(t.members.len(), 6, "team {:?}", t);
            assert!(t.employee_count <= 1);
            assert_eq!(t.org, None);
        }
        let counts = membership_counts(&res.round1);
        assert_eq!(counts.len(), members.len());
        assert!(counts.values().all(|&c| c == 1));
    }

    #[test]
    fn round1_ids_are_sequential() {
        let members = three_org_roster();
        let res = run_assignment(&members, &AssignmentRules::DEFAULT_RULES).unwrap();
        let ids: Vec<&str> = res.round1.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(&ids[..2], &["R1-01", "R1-02"]);
    }

    #[test]
    fn round1_refills_from_the_same_organization() {
        // Only two organizations: the team can only fill by taking more than
        // one batch from the non-home pool.
        let mut members = Vec::new();
        mk("AAA", EmploymentStatus::Employee, 1, &mut members);
        mk("AAA", EmploymentStatus::Incoming, 2, &mut members);
        mk("BBB", EmploymentStatus::Incoming, 5, &mut members);

        let res = run_assignment(&members, &AssignmentRules::DEFAULT_RULES).unwrap();
        assert_eq!(res.round1.len(), 1);
        assert_eq!(res.round1[0].members.len(), 6);
        // 2 of the 5 BBB hires are left over: not enough for a full team.
        assert_eq!(res.unassigned.len(), 2);
    }

    #[test]
    fn round1_reports_members_of_short_teams() {
        let mut members = Vec::new();
        mk("AAA", EmploymentStatus::Employee, 1, &mut members);
        mk("AAA", EmploymentStatus::Incoming, 1, &mut members);

        let res = run_assignment(&members, &AssignmentRules::DEFAULT_RULES).unwrap();
        assert!(res.round1.is_empty());
        assert_eq!(res.unassigned.len(), 2);
        // Round 2 still covers both.
        let counts = membership_counts(&res.round2);
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn round2_single_org_and_exhaustive() {
        let members = three_org_roster();
        let res = run_assignment(&members, &AssignmentRules::DEFAULT_RULES).unwrap();

        let by_id: HashMap<&str, &Member> =
            members.iter().map(|m| (m.id.as_str(), m)).collect();
        for t in res.round2.iter() {
            let org = t.org.as_deref().expect("round-2 team without org");
            assert!(t.id.starts_with(&format!("R2-{}", org)));
            assert!(t.members.len() <= 7);
            for m in t.members.iter() {
                assert_eq!(by_id[m.as_str()].org, org);
            }
        }
        let counts = membership_counts(&res.round2);
        assert_eq!(counts.len(), members.len());
        assert!(counts.values().all(|&c| c == 1));
        // AAA: 2 employee teams; BBB: 1 employee team + 1 remainder team;
        // CCC: 2 employee-less teams.
        assert_eq!(res.round2.len(), 6);
    }

    #[test]
    fn assignment_is_deterministic() {
        let members = three_org_roster();
        let a = run_assignment(&members, &AssignmentRules::DEFAULT_RULES).unwrap();
        let b = run_assignment(&members, &AssignmentRules::DEFAULT_RULES).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_roster_is_rejected() {
        let res = run_assignment(&[], &AssignmentRules::DEFAULT_RULES);
        assert_eq!(res, Err(AssignmentErrors::EmptyRoster));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let m = Member {
            id: "AAA_NEW_0001".to_string(),
            org: "AAA".to_string(),
            status: EmploymentStatus::Incoming,
        };
        let res = run_assignment(&[m.clone(), m], &AssignmentRules::DEFAULT_RULES);
        assert_eq!(res, Err(AssignmentErrors::DuplicateMember));
    }

    #[test]
    fn inconsistent_rules_are_rejected() {
        let mut members = Vec::new();
        mk("AAA", EmploymentStatus::Incoming, 3, &mut members);
        let mut rules = AssignmentRules::DEFAULT_RULES;
        rules.team_size = 1;
        assert_eq!(
            run_assignment(&members, &rules),
            Err(AssignmentErrors::InvalidRules)
        );
        let mut rules = AssignmentRules::DEFAULT_RULES;
        rules.home_incoming_count = 6;
        assert_eq!(
            run_assignment(&members, &rules),
            Err(AssignmentErrors::InvalidRules)
        );
    }

    #[test]
    fn roster_without_employees_still_batches() {
        let mut members = Vec::new();
        mk("AAA", EmploymentStatus::Incoming, 6, &mut members);
        mk("BBB", EmploymentStatus::Incoming, 6, &mut members);
        let res = run_assignment(&members, &AssignmentRules::DEFAULT_RULES).unwrap();
        assert_eq!(res.round1.len(), 2);
        assert!(res.round1.iter().all(|t| t.employee_count == 0));
        assert!(res.unassigned.is_empty());
    }
}
