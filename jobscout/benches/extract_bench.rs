//! Benchmarks for query parsing and page extraction.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jobscout::config::{DetailSelectors, ListingSelectors, QueryDefaults};
use jobscout::extract::{DetailExtractor, ListingExtractor};
use jobscout::query::QueryParser;
use jobscout::testing::fixtures::sample_summary;
use jobscout::testing::{detail_page, listing_card, listing_page, CardSpec, DetailSpec};

fn listing_html(cards: usize) -> String {
    let cards: Vec<String> = (1..=cards)
        .map(|i| {
            listing_card(
                &CardSpec::new(&format!("Analyst {i}"), &format!("/job/analyst-{i}"))
                    .company("Acme Corp")
                    .location("Chicago, IL")
                    .salary("$70,000")
                    .recency("Today")
                    .id(&format!("id-{i}")),
            )
        })
        .collect();
    listing_page(&cards)
}

fn extraction_benchmark(c: &mut Criterion) {
    let listing = ListingExtractor::new(&ListingSelectors::default()).unwrap();
    let page = listing_html(50);
    c.bench_function("listing_50_cards", |b| {
        b.iter(|| listing.extract(black_box(&page), 50));
    });
    c.bench_function("listing_limit_5", |b| {
        b.iter(|| listing.extract(black_box(&page), 5));
    });

    let detail = DetailExtractor::new(&DetailSelectors::default()).unwrap();
    let mut posting = DetailSpec::new("Senior Analyst").company("Acme Corp").job_type("Full-time");
    for i in 0..20 {
        posting = posting.requirement(&format!("Requirement number {i}"));
    }
    let detail_html = detail_page(&posting);
    let summary = sample_summary(1);
    c.bench_function("detail_page", |b| {
        b.iter(|| detail.extract(black_box(&detail_html), &summary));
    });
}

fn parser_benchmark(c: &mut Criterion) {
    let parser = QueryParser::new(QueryDefaults::default()).unwrap();
    c.bench_function("parse_query", |b| {
        b.iter(|| parser.parse(black_box("find me hr admin jobs near winnetka within 5 miles posted today")));
    });
}

criterion_group!(benches, extraction_benchmark, parser_benchmark);
criterion_main!(benches);
