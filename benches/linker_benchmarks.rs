//! Linker Performance Benchmarks
//!
//! Measures reference extraction and commit-ticket linking over synthetic
//! histories of increasing size.

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

use defectset::linker::{CommitTicketLinker, ReferenceExtractor};
use defectset::model::{CommitInfo, Release, Ticket, TicketStatus, TicketType};
use defectset::timeline::ReleaseTimeline;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
}

fn timeline(releases: usize) -> ReleaseTimeline {
    let mut timeline = ReleaseTimeline::new();
    for i in 0..releases {
        let date = start() + Duration::days(90 * i as i64);
        timeline.add(Release::new(i.to_string(), format!("4.{}.0", i), date, true));
    }
    timeline
}

fn tickets(count: usize) -> Vec<Ticket> {
    (0..count)
        .map(|i| {
            let created = start() + Duration::days(i as i64 % 1500);
            Ticket::new(
                i.to_string(),
                format!("BOOKKEEPER-{}", i),
                created,
                created + Duration::days(30),
                TicketType::Bug,
                TicketStatus::Closed,
                "",
            )
        })
        .collect()
}

fn commits(count: usize, ticket_count: usize) -> Vec<Arc<CommitInfo>> {
    (0..count)
        .map(|i| {
            let message = match i % 4 {
                0 => format!("BOOKKEEPER-{}: fix ledger recovery", i % ticket_count),
                1 => format!("ISSUE {} address review comments", i % ticket_count),
                2 => format!("Follow-up for #{}", i % ticket_count),
                _ => "Update documentation".to_string(),
            };
            Arc::new(CommitInfo::new(
                format!("{:040x}", i),
                "Bench",
                "bench@example.org",
                start() + Duration::days(i as i64 % 1800),
                message,
            ))
        })
        .collect()
}

fn bench_reference_extraction(c: &mut Criterion) {
    let extractor = ReferenceExtractor::new("BOOKKEEPER").unwrap();
    let message = "BOOKKEEPER-123 fix bookie shutdown, see also ISSUE 456 and #789\n\nLonger description of the change";

    c.bench_function("canonical_keys", |b| {
        b.iter(|| extractor.canonical_keys(black_box(message)))
    });
}

fn bench_linking(c: &mut Criterion) {
    let timeline = timeline(24);
    let linker = CommitTicketLinker::new("BOOKKEEPER").unwrap();
    let mut group = c.benchmark_group("link");

    for &commit_count in &[1_000usize, 10_000] {
        let commits = commits(commit_count, 2_000);
        group.throughput(Throughput::Elements(commit_count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(commit_count), &commits, |b, commits| {
            b.iter_batched(
                || tickets(2_000),
                |mut tickets| linker.link(&mut tickets, commits, &timeline),
                criterion::BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reference_extraction, bench_linking);
criterion_main!(benches);
