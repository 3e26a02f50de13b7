//! End-to-end lock scenarios against the in-memory page

use seeklock::page::{Page, Session};
use seeklock::platform::{Dom, MediaHooks, Trigger};
use seeklock::{LockConfig, Phase, Target};

const PLAYER: &str = r#"<!DOCTYPE html>
<html>
<head><title>Course</title></head>
<body>
<div class="slide">
  <div data-model-id="vid1" class="video-player">
    <video></video>
    <div class="video-seekbar"><div class="video-seekbar-seek-thumb"></div></div>
    <div class="video-playback-speed">1x</div>
  </div>
</div>
</body>
</html>"#;

fn style_count(page: &Page) -> usize {
    page.elements_by_tag(page.main_document(), "style").unwrap().len()
}

#[test]
fn locked_video_reverts_forward_seek() -> anyhow::Result<()> {
    let mut s = Session::new(Page::from_html(PLAYER), LockConfig::default())?;
    assert_eq!(s.install(Target::new("vid1", true))?, Phase::Active);
    assert_eq!(style_count(s.page()), 1);
    let doc = s.page().main_document();
    assert!(s.page().element_by_id(doc, "slVideoLockStyle_vid1")?.is_some());

    let video = s.page().videos()[0];
    s.page_mut().play(video);
    s.page_mut().play_for(video, 10.0);
    let before = s.page().current_time(video).unwrap();
    assert_eq!(before, 10.0);

    s.page_mut().seek(video, before + 5.0);
    let after = s.page().current_time(video).unwrap();
    assert!((after - before).abs() <= 0.25, "seek landed at {}", after);

    // polling keeps running without injecting the style again
    s.advance(2_000)?;
    assert_eq!(style_count(s.page()), 1);
    Ok(())
}

#[test]
fn empty_identifier_alerts_once() -> anyhow::Result<()> {
    let mut s = Session::new(Page::from_html(PLAYER), LockConfig::default())?;
    s.install(Target::new("", true))?;
    s.advance(10_000)?;
    s.install(Target::new("  ", true))?;

    assert_eq!(s.page().alerts().len(), 1);
    assert!(s.page().alerts()[0].contains("target id is empty"));
    assert_eq!(style_count(s.page()), 0);
    let video = s.page().videos()[0];
    assert_eq!(s.page().media_listener_count(video), 0);
    assert_eq!(s.page().active_observers(), 0);
    Ok(())
}

#[test]
fn unlocking_removes_everything() -> anyhow::Result<()> {
    let mut s = Session::new(Page::from_html(PLAYER), LockConfig::default())?;
    s.install(Target::new("vid1", true))?;
    s.advance(1_000)?;
    let video = s.page().videos()[0];
    assert_eq!(s.page().media_listener_count(video), 3);

    assert_eq!(s.install(Target::new("vid1", false))?, Phase::Quiescent);
    assert_eq!(style_count(s.page()), 0);
    assert_eq!(s.page().media_listener_count(video), 0);
    assert_eq!(s.page().active_observers(), 0);
    assert!(s.page().pending_timers().is_empty());

    let cycles = s.reconciler("vid1").unwrap().cycles();
    assert_eq!(s.advance(5_000)?, 0);
    let doc = s.page().main_document();
    s.page_mut().append_to_body(doc, "<p>slide 2</p>")?;
    assert_eq!(s.flush_mutations()?, 0);
    assert_eq!(s.reconciler("vid1").unwrap().cycles(), cycles);

    // seeking is free again
    s.page_mut().seek(video, 120.0);
    assert_eq!(s.page().current_time(video), Some(120.0));
    Ok(())
}

#[test]
fn late_container_locks_without_alert() -> anyhow::Result<()> {
    let mut s = Session::new(Page::from_html("<html><head></head><body></body></html>"), LockConfig::default())?;
    assert_eq!(s.install(Target::new("vid1", true))?, Phase::Unresolved);
    assert!(s.reconciler("vid1").unwrap().state().is_armed(Trigger::AlertDeadline));

    s.advance(1_000)?;
    let doc = s.page().main_document();
    s.page_mut()
        .append_to_body(doc, r#"<div data-model-id="vid1"><video></video></div>"#)?;
    assert!(s.flush_mutations()? >= 1);
    assert_eq!(s.reconciler("vid1").unwrap().phase(), Phase::Active);

    s.advance(5_000)?;
    assert!(s.page().alerts().is_empty());
    let video = s.page().videos()[0];
    assert!(s.reconciler("vid1").unwrap().lock_controller().is_locked(video));
    Ok(())
}

#[test]
fn unresolved_target_alerts_after_grace_window() -> anyhow::Result<()> {
    let mut s = Session::new(Page::from_html("<html><body></body></html>"), LockConfig::default())?;
    s.install(Target::new("vid1", true))?;
    s.advance(2_999)?;
    assert!(s.page().alerts().is_empty());
    s.advance(1)?;
    assert_eq!(s.page().alerts().len(), 1);
    assert!(s.page().alerts()[0].contains("vid1"));
    Ok(())
}
