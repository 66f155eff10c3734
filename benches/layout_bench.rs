use criterion::{black_box, criterion_group, criterion_main, Criterion};

use hookframe::rendering::paint::paint_tree;
use hookframe::{derive_layout, LayoutOptions, Platform, PostFormat, PostSettings, SettingsPatch};

fn settings(content: &str, format: PostFormat, platform: Platform) -> PostSettings {
    let mut s = PostSettings::default();
    s.merge(SettingsPatch {
        content: Some(content.to_string()),
        format: Some(format),
        platform: Some(platform),
        creator_name: Some("Bench Mark".into()),
        ..Default::default()
    });
    s
}

// One keystroke re-derives the whole plan, so this is the latency that matters.
fn bench_derive_layout(c: &mut Criterion) {
    let short = settings("Most people think they need more time.", PostFormat::CreatorCard, Platform::Facebook);
    let long = settings(
        &"Every draft is a step closer to the thing you meant to say. ".repeat(8),
        PostFormat::LongThought,
        Platform::Instagram,
    );
    let list = settings(
        "1. Wake up\n2. Write\n3. Ship\n4. Listen\n5. Repeat",
        PostFormat::ListDrop,
        Platform::InstagramStory,
    );

    c.bench_function("derive_layout_short", |b| {
        b.iter(|| derive_layout(black_box(&short), &LayoutOptions::default()))
    });
    c.bench_function("derive_layout_long", |b| {
        b.iter(|| derive_layout(black_box(&long), &LayoutOptions::default()))
    });
    c.bench_function("derive_layout_list", |b| {
        b.iter(|| derive_layout(black_box(&list), &LayoutOptions::default()))
    });
}

fn bench_paint(c: &mut Criterion) {
    let plan = derive_layout(
        &settings(&"word ".repeat(80), PostFormat::HookOnly, Platform::Twitter),
        &LayoutOptions::default(),
    );
    c.bench_function("paint_tree", |b| b.iter(|| paint_tree(black_box(&plan.tree))));
}

criterion_group!(benches, bench_derive_layout, bench_paint);
criterion_main!(benches);
