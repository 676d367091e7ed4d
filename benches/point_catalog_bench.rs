use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use point_catalog_core::algo::dictionaries::builtin_dictionaries;
use point_catalog_core::algo::{automap, matcher, normalizer, signature, tokenizer};
use point_catalog_core::config::EngineConfig;
use point_catalog_core::model::{
    EquipmentRef, EquipmentTemplate, MatchingFacet, NormalizationContext, ObjectType,
    ObservedPoint, PointFunction, PointTemplate, RawPoint, TemplateType,
};

fn sample_identifiers(n: usize) -> Vec<String> {
    let bases = [
        "SA_TS", "ZN-T SP", "HGR_SIG", "DAMPER POS", "ROOM TEMP", "RA-T", "OA_CFM", "CHW_VLV_POS",
        "SF_STAT", "EF_CMD",
    ];
    (0..n)
        .map(|i| format!("{}-{}", bases[i % bases.len()], i))
        .collect()
}

fn sample_raw_points(n: usize) -> Vec<RawPoint> {
    sample_identifiers(n)
        .into_iter()
        .enumerate()
        .map(|(i, display_name)| RawPoint {
            object_name: format!("AI{i}"),
            object_type: Some(ObjectType::AI),
            display_name,
            description: None,
            units: Some("°F".to_string()),
            is_writable: false,
            is_command: false,
        })
        .collect()
}

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("tokenize/single", |b| {
        b.iter(|| tokenizer::tokenize(black_box("SA_TS_ROOM_4")))
    });
}

fn bench_normalize(c: &mut Criterion) {
    let dict = builtin_dictionaries();
    let cfg = EngineConfig::default();
    let ctx = NormalizationContext {
        equipment_type: Some("VAV_CONTROLLER".to_string()),
        ..Default::default()
    };
    let points = sample_raw_points(1000);

    c.bench_function("normalize/1000_points", |b| {
        b.iter(|| {
            for p in &points {
                black_box(normalizer::normalize(p, &ctx, &dict, &cfg.normalizer));
            }
        })
    });
}

fn observed_points(n: usize) -> Vec<ObservedPoint> {
    let dict = builtin_dictionaries();
    let cfg = EngineConfig::default();
    let ctx = NormalizationContext::default();
    sample_raw_points(n)
        .iter()
        .map(|p| {
            let normalized = normalizer::normalize(p, &ctx, &dict, &cfg.normalizer);
            let sig = signature::signature(&normalized, p.object_type, &cfg.signature);
            ObservedPoint {
                object_name: p.object_name.clone(),
                normalized,
                signature: sig,
                bacnet_cur: None,
                bacnet_dis: Some(p.display_name.clone()),
                bacnet_desc: None,
            }
        })
        .collect()
}

fn sample_template() -> EquipmentTemplate {
    EquipmentTemplate {
        id: "tmpl-bench".to_string(),
        name: "VAV Terminal".to_string(),
        description: None,
        equipment_type: "VAV_CONTROLLER".to_string(),
        category: None,
        vendor: None,
        model: None,
        points: vec![PointTemplate {
            template_point_id: "tp-1".to_string(),
            name: "Room Temperature".to_string(),
            description: None,
            point_function: PointFunction::Sensor,
            object_type: Some(ObjectType::AI),
            units: Some("°F".to_string()),
            required: true,
            nav_name: None,
            bacnet_cur: None,
            bacnet_dis: Some("ROOM TEMP-0".to_string()),
            bacnet_desc: None,
            matching_facet: MatchingFacet::BacnetDis,
            default_confidence: 0.80,
            tags: vec![],
        }],
        template_type: TemplateType::Equipment,
        is_built_in: true,
        is_default: true,
        usage_count: 0,
        success_rate: 0.0,
        effectiveness: 0.0,
        created_at: 0,
        updated_at: 0,
    }
}

fn bench_match_template(c: &mut Criterion) {
    let cfg = EngineConfig::default();
    let template = sample_template();
    let mut group = c.benchmark_group("match_template");
    for size in [100, 1000, 5000] {
        let points = observed_points(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &points, |b, pts| {
            b.iter(|| black_box(matcher::match_template(pts, &template, &cfg)))
        });
    }
    group.finish();
}

fn sample_equipment(n: usize, prefix: &str) -> Vec<EquipmentRef> {
    (0..n)
        .map(|i| EquipmentRef {
            id: format!("{prefix}-{i}"),
            name: format!("VAV-{i:04}"),
            equipment_type: Some("VAV_CONTROLLER".to_string()),
            location: None,
        })
        .collect()
}

fn bench_auto_map(c: &mut Criterion) {
    let cfg = EngineConfig::default().auto_mapper;
    let mut group = c.benchmark_group("auto_map");
    for size in [50, 200, 500] {
        let sources = sample_equipment(size, "src");
        let targets = sample_equipment(size, "tgt");
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &(sources, targets),
            |b, (s, t)| b.iter(|| black_box(automap::auto_map(s, t, &cfg))),
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_tokenize,
    bench_normalize,
    bench_match_template,
    bench_auto_map,
);
criterion_main!(benches);
