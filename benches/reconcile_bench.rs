use criterion::{black_box, criterion_group, criterion_main, Criterion};

use seeklock::page::{Origin, Page, Session};
use seeklock::{collect_documents, resolve_video, LockConfig, Reconciler, Target};

/// A top document with `frames` same-origin frames, a few cross-origin ones,
/// and the target video inside the last same-origin frame
fn frame_heavy_page(frames: usize) -> Page {
    let filler: String = (0..40).map(|i| format!("<div class=\"layer\" id=\"l{}\"><span>text</span></div>", i)).collect();
    let mut page = Page::from_html(&format!("<html><head></head><body>{}</body></html>", filler));
    let top = page.main_document();
    for i in 0..frames {
        let body = if i + 1 == frames {
            format!("{}<div data-model-id=\"vid1\"><video></video></div>", filler)
        } else {
            filler.clone()
        };
        let html = format!("<html><head></head><body>{}</body></html>", body);
        let _ = page.add_frame(top, &html, Origin::Same);
        if i % 4 == 0 {
            let _ = page.add_frame(top, &html, Origin::Cross);
        }
    }
    page
}

fn bench_collect_and_resolve(c: &mut Criterion) {
    let page = frame_heavy_page(12);
    let config = LockConfig::default();

    c.bench_function("collect_and_resolve", |b| {
        b.iter(|| {
            let docs = collect_documents(&page, config.max_parent_hops, &config.frame_tag);
            black_box(resolve_video(&page, "vid1", &docs, &config))
        })
    });
}

fn bench_apply_cycle(c: &mut Criterion) {
    let mut page = frame_heavy_page(12);
    let mut reconciler = Reconciler::new(Target::new("vid1", true), LockConfig::default());
    reconciler.start(&mut page);

    c.bench_function("apply_cycle_locked", |b| {
        b.iter(|| {
            reconciler.apply(&mut page);
            black_box(reconciler.phase())
        })
    });
}

fn bench_session_polling(c: &mut Criterion) {
    c.bench_function("session_poll_10s", |b| {
        b.iter(|| {
            let mut s = Session::new(frame_heavy_page(4), LockConfig::default()).expect("valid config");
            let _ = s.install(Target::new("vid1", true));
            black_box(s.advance(10_000).expect("bounded wakeups"))
        })
    });
}

criterion_group!(benches, bench_collect_and_resolve, bench_apply_cycle, bench_session_polling);
criterion_main!(benches);
