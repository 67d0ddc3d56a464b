//! Commit-Ticket Linker
//!
//! Attaches commits to the tickets their messages reference and infers the
//! Fix Version of tickets that do not declare one.

pub mod error;
pub mod references;

pub use error::{LinkerError, LinkerResult};
pub use references::ReferenceExtractor;

use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{CommitInfo, FixSource, Ticket};
use crate::resolver::VersionResolver;
use crate::timeline::ReleaseTimeline;

/// Outcome of a linking pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkReport {
    pub commits_scanned: usize,
    /// Commits whose message references no ticket key at all
    pub commits_without_reference: usize,
    /// Canonical keys that matched no ticket
    pub unmatched_references: usize,
    /// New commit attachments made by this pass
    pub attachments: usize,
    pub fix_versions_inferred: usize,
    /// Tickets with neither a fix version nor any associated commit
    pub unresolved: Vec<String>,
    /// Tickets whose latest commit postdates every known release
    pub no_release_after_commit: Vec<String>,
}

/// Links commits to tickets by the references in their messages
pub struct CommitTicketLinker {
    extractor: ReferenceExtractor,
}

impl CommitTicketLinker {
    pub fn new(project_name: &str) -> LinkerResult<Self> {
        Ok(Self {
            extractor: ReferenceExtractor::new(project_name)?,
        })
    }

    pub fn extractor(&self) -> &ReferenceExtractor {
        &self.extractor
    }

    /// Attach commits to tickets, then infer missing fix versions.
    ///
    /// Running the pass again over the same inputs attaches nothing new.
    pub fn link(&self, tickets: &mut [Ticket], commits: &[Arc<CommitInfo>], timeline: &ReleaseTimeline) -> LinkReport {
        let mut report = LinkReport::default();
        let index = build_key_index(tickets);

        for commit in commits {
            report.commits_scanned += 1;
            let keys = self.extractor.canonical_keys(&commit.message);

            if keys.is_empty() {
                debug!("No ticket reference in commit {}: {}", commit.commit_id, commit.summary());
                report.commits_without_reference += 1;
                continue;
            }

            for key in keys {
                match index.get(&key) {
                    Some(&position) => {
                        if tickets[position].attach_commit(Arc::clone(commit)) {
                            report.attachments += 1;
                        }
                    }
                    None => {
                        debug!("No ticket matches reference {} in commit {}", key, commit.commit_id);
                        report.unmatched_references += 1;
                    }
                }
            }
        }

        info!(
            "Linked {} commit attachments from {} commits ({} without references)",
            report.attachments, report.commits_scanned, report.commits_without_reference
        );

        self.infer_fix_versions(tickets, timeline, &mut report);
        report
    }

    fn infer_fix_versions(&self, tickets: &mut [Ticket], timeline: &ReleaseTimeline, report: &mut LinkReport) {
        let resolver = VersionResolver::new(timeline);

        for ticket in tickets.iter_mut().filter(|t| t.fixed().is_none()) {
            let Some(latest) = ticket.latest_commit_date() else {
                warn!("Ticket {} has no fix version and no associated commits", ticket.key);
                report.unresolved.push(ticket.key.clone());
                continue;
            };

            match resolver.resolve_fix_version(latest) {
                Some(release) => {
                    debug!("Ticket {} fix version inferred as {} (latest commit {})", ticket.key, release.name, latest);
                    ticket.set_fixed(release.clone(), FixSource::InferredFromCommits);
                    report.fix_versions_inferred += 1;
                }
                None => {
                    warn!("No release exists after the last commit date {} of ticket {}", latest, ticket.key);
                    report.no_release_after_commit.push(ticket.key.clone());
                }
            }
        }

        if !report.unresolved.is_empty() {
            warn!("{} tickets remain without a fix version", report.unresolved.len());
        }
    }
}

/// Upper-cased key to the position of the first ticket carrying it
fn build_key_index(tickets: &[Ticket]) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(tickets.len());
    for (position, ticket) in tickets.iter().enumerate() {
        index.entry(ticket.key.to_uppercase()).or_insert(position);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Release, TicketStatus, TicketType};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn timeline() -> ReleaseTimeline {
        let mut timeline = ReleaseTimeline::new();
        timeline.add(Release::new("1", "R1", date(2020, 1, 1), true));
        timeline.add(Release::new("2", "R2", date(2020, 6, 1), true));
        timeline.add(Release::new("3", "R3", date(2021, 1, 1), true));
        timeline
    }

    fn ticket(key: &str) -> Ticket {
        Ticket::new("0", key, date(2020, 2, 1), date(2020, 3, 1), TicketType::Bug, TicketStatus::Closed, "")
    }

    fn commit(id: &str, day: NaiveDate, message: &str) -> Arc<CommitInfo> {
        Arc::new(CommitInfo::new(id, "Dev", "dev@example.com", day, message))
    }

    #[test]
    fn test_link_attaches_and_infers_fix_version() {
        let timeline = timeline();
        let linker = CommitTicketLinker::new("PROJ").unwrap();
        let mut tickets = vec![ticket("PROJ-42"), ticket("proj-7"), ticket("PROJ-9")];
        let commits = vec![
            commit("c1", date(2020, 3, 1), "Fixes PROJ-42 and partially #7"),
            commit("c2", date(2020, 7, 1), "PROJ-42 follow-up"),
            commit("c3", date(2020, 4, 1), "Refactor build"),
            commit("c4", date(2020, 4, 2), "PROJ-1000 unknown ticket"),
        ];

        let report = linker.link(&mut tickets, &commits, &timeline);

        assert_eq!(report.commits_scanned, 4);
        assert_eq!(report.commits_without_reference, 1);
        assert_eq!(report.unmatched_references, 1);
        assert_eq!(report.attachments, 3);
        assert_eq!(report.fix_versions_inferred, 2);
        assert_eq!(report.unresolved, vec!["PROJ-9".to_string()]);

        assert_eq!(tickets[0].associated_commits().len(), 2);
        assert_eq!(tickets[0].fixed().unwrap().name, "R3");
        assert_eq!(tickets[0].fix_source(), Some(FixSource::InferredFromCommits));
        assert_eq!(tickets[1].associated_commits().len(), 1);
        assert_eq!(tickets[1].fixed().unwrap().name, "R2");
    }

    #[test]
    fn test_link_is_idempotent() {
        let timeline = timeline();
        let linker = CommitTicketLinker::new("PROJ").unwrap();
        let mut tickets = vec![ticket("PROJ-1"), ticket("PROJ-2")];
        let commits = vec![
            commit("a", date(2020, 2, 1), "PROJ-1 PROJ-2"),
            commit("b", date(2020, 2, 2), "ISSUE 1 again"),
        ];

        let first = linker.link(&mut tickets, &commits, &timeline);
        let second = linker.link(&mut tickets, &commits, &timeline);

        assert_eq!(first.attachments, 3);
        assert_eq!(second.attachments, 0);
        assert_eq!(second.fix_versions_inferred, 0);
        assert_eq!(tickets[0].associated_commits().len(), 2);
        assert_eq!(tickets[1].associated_commits().len(), 1);
    }

    #[test]
    fn test_declared_fix_version_is_kept() {
        let timeline = timeline();
        let linker = CommitTicketLinker::new("PROJ").unwrap();
        let mut declared = ticket("PROJ-5");
        declared.set_fixed(timeline.find_by_name("R1").unwrap().clone(), FixSource::Tracker);
        let mut tickets = vec![declared];

        let report = linker.link(&mut tickets, &[commit("x", date(2020, 8, 1), "PROJ-5")], &timeline);

        assert_eq!(report.fix_versions_inferred, 0);
        assert_eq!(tickets[0].fixed().unwrap().name, "R1");
        assert_eq!(tickets[0].fix_source(), Some(FixSource::Tracker));
    }

    #[test]
    fn test_commit_after_last_release_is_reported() {
        let timeline = timeline();
        let linker = CommitTicketLinker::new("PROJ").unwrap();
        let mut tickets = vec![ticket("PROJ-3")];

        let report = linker.link(&mut tickets, &[commit("late", date(2022, 1, 1), "PROJ-3")], &timeline);

        assert_eq!(report.no_release_after_commit, vec!["PROJ-3".to_string()]);
        assert!(tickets[0].fixed().is_none());
    }

    #[test]
    fn test_first_ticket_with_duplicate_key_wins() {
        let timeline = timeline();
        let linker = CommitTicketLinker::new("PROJ").unwrap();
        let mut tickets = vec![ticket("PROJ-8"), ticket("PROJ-8")];

        linker.link(&mut tickets, &[commit("d", date(2020, 2, 1), "PROJ-8")], &timeline);

        assert_eq!(tickets[0].associated_commits().len(), 1);
        assert!(tickets[1].associated_commits().is_empty());
    }
}
