use chrono::{NaiveDate, TimeZone, Utc};
use cloudcost::{AnalysisRequest, Analyzer, CostCalculator, RateCatalog, Snapshot};
use cloudcost_analysis::CostAggregator;
use cloudcost_core::types::{CostRecord, EbsVolume, Ec2Instance, InstanceState, VolumeState};
use criterion::{Criterion, criterion_group, criterion_main};
use rust_decimal::Decimal;
use std::hint::black_box;
use std::sync::Arc;

const SERVICES: &[&str] = &["EC2", "S3", "RDS", "Lambda", "CloudFront", "DynamoDB"];
const REGIONS: &[&str] = &["us-east-1", "us-west-2", "eu-central-1", "ap-southeast-1"];
const INSTANCE_TYPES: &[&str] = &["t3.micro", "t3.medium", "m5.large", "c5.xlarge"];

fn create_cost_records(count: usize) -> Vec<CostRecord> {
    (0..count)
        .map(|i| {
            let day = (i % 28) as u32 + 1;
            let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
            CostRecord::new(
                SERVICES[i % SERVICES.len()],
                Decimal::new((i as i64 * 137) % 100_000, 2),
                REGIONS[i % REGIONS.len()],
                date,
                date,
            )
        })
        .collect()
}

fn create_snapshot(count: usize) -> Snapshot {
    let ec2_instances = (0..count)
        .map(|i| {
            let region = REGIONS[i % REGIONS.len()];
            Ec2Instance {
                instance_id: format!("i-{i:08x}"),
                instance_type: INSTANCE_TYPES[i % INSTANCE_TYPES.len()].to_string(),
                state: if i % 7 == 0 {
                    InstanceState::Stopped
                } else {
                    InstanceState::Running
                },
                region: region.to_string(),
                availability_zone: format!("{region}a"),
                launch_time: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
                cpu_utilization: (i % 40) as f64,
                is_idle: false,
                tags: Vec::new(),
            }
        })
        .collect();

    let ebs_volumes = (0..count)
        .map(|i| {
            let region = REGIONS[i % REGIONS.len()];
            let attached = i % 3 != 0;
            EbsVolume {
                volume_id: format!("vol-{i:08x}"),
                size: (i % 500) as u32 + 8,
                volume_type: if i % 2 == 0 { "gp3" } else { "gp2" }.to_string(),
                state: if attached {
                    VolumeState::InUse
                } else {
                    VolumeState::Available
                },
                is_attached: attached,
                instance_id: None,
                region: region.to_string(),
                availability_zone: format!("{region}a"),
            }
        })
        .collect();

    Snapshot {
        cost_records: create_cost_records(count),
        ec2_instances,
        ebs_volumes,
    }
}

fn benchmark_cost_summary(c: &mut Criterion) {
    let mut group = c.benchmark_group("cost_summary");
    let aggregator = CostAggregator::default();

    for count in [100, 10_000] {
        let records = create_cost_records(count);
        group.bench_function(format!("summarize_{count}_records"), |b| {
            b.iter(|| {
                let summary = aggregator
                    .summarize(black_box(&records), None, None)
                    .unwrap();
                black_box(summary)
            });
        });
    }

    group.finish();
}

fn benchmark_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis");
    group.sample_size(20);

    let analyzer = Analyzer::new(CostCalculator::new(Arc::new(
        RateCatalog::embedded().unwrap(),
    )));
    let as_of = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
    let snapshot = create_snapshot(5_000);
    let request = AnalysisRequest::default();

    group.bench_function("analyze_5000_resources", |b| {
        b.iter(|| {
            let report = analyzer
                .analyze(black_box(&snapshot), &request, as_of)
                .unwrap();
            black_box(report)
        });
    });

    group.bench_function("savings_5000_resources", |b| {
        b.iter(|| black_box(analyzer.savings(black_box(&snapshot), as_of).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, benchmark_cost_summary, benchmark_analysis);
criterion_main!(benches);
