//! Full-session reconciliation: the exact message sequence the embedding
//! server emits for one upload cycle, parsed from raw JSON and driven
//! through the reconciler.

use lyrsync_proto::presenter::partition;
use lyrsync_proto::protocol::{StreamEvent, TrackStatus};
use lyrsync_proto::reconciler::Reconciler;

fn apply(rec: &mut Reconciler, event: &str, data: &str) -> lyrsync_proto::reconciler::Outcome {
    let parsed = StreamEvent::parse(event, data).expect("frame should parse");
    rec.apply(parsed)
}

#[test]
fn test_full_upload_cycle() {
    let mut rec = Reconciler::new();

    // 1. Analysis snapshot: three uploaded tracks plus one file the server
    //    could not assign a number to.
    apply(
        &mut rec,
        "track_analysis",
        r#"{"success": true, "tracks": [
            {"track_number": 1, "filename": "01 Intro.mp3", "size": 2400000, "status": "uploaded", "message": "File uploaded"},
            {"track_number": 2, "filename": "02 Song.mp3", "size": 5100000, "status": "uploaded", "message": "File uploaded"},
            {"track_number": 3, "filename": "03 Outro.mp3", "size": 3800000, "status": "uploaded", "message": "File uploaded"},
            {"track_number": null, "filename": "hidden.mp3", "size": 0, "status": "error", "message": "File does not have a track number in its metadata"}
        ], "upload_dir": "/srv/media"}"#,
    );
    assert_eq!(rec.registry().len(), 4);

    // 2. Periodic batch: lyrics located for 1 and 3, nothing for 2 yet.
    //    The batch also references track 7, which we never uploaded.
    let outcome = apply(
        &mut rec,
        "tracks",
        r#"{"tracks": [
            {"track_number": 1, "title": "Intro", "artist": "Band", "url": "https://g/intro", "status": "found", "message": "lyrics found..."},
            {"track_number": 3, "title": "Outro", "artist": "Band", "url": "https://g/outro", "status": "found", "message": "lyrics found..."},
            {"track_number": 7, "title": "Ghost", "artist": "Band", "url": "", "status": "error", "message": "lyrics not found"}
        ]}"#,
    );
    assert_eq!(outcome.changed.len(), 2);
    assert!(rec.registry().get(7).is_none(), "membership is authoritative");
    assert_eq!(rec.registry().get(2).unwrap().status, TrackStatus::Uploaded);

    // 3. Point updates with overall progress.
    let outcome = apply(
        &mut rec,
        "track_update",
        r#"{"track_number": 1, "status": "processing", "message": "Processing...",
            "title": "Intro", "artist": "Band", "track_id": "intro", "progress": 50.0}"#,
    );
    assert_eq!(outcome.progress, Some(50.0));

    apply(
        &mut rec,
        "track_update",
        r#"{"track_number": 1, "status": "success", "message": "Lyrics successfully embedded",
            "url": "https://g/intro", "progress": 33.3}"#,
    );
    apply(
        &mut rec,
        "track_update",
        r#"{"track_number": 3, "status": "success", "message": "Lyrics successfully embedded",
            "progress": 66.6}"#,
    );

    // 4. Verification pass downgrades track 2.
    apply(
        &mut rec,
        "album_lyrics",
        r#"{"tracks": [
            {"track_number": 1, "is_valid": true, "status": "success", "message": "Lyrics successfully embedded"},
            {"track_number": 2, "is_valid": false, "status": "error", "message": "no usable lyrics"},
            {"track_number": 3, "is_valid": true, "status": "success", "message": "Lyrics successfully embedded"}
        ]}"#,
    );

    // Final registry state.
    assert_eq!(rec.registry().get(1).unwrap().status, TrackStatus::Success);
    assert_eq!(rec.registry().get(2).unwrap().status, TrackStatus::Error);
    assert_eq!(rec.registry().get(2).unwrap().message, "no usable lyrics");
    assert_eq!(rec.registry().get(3).unwrap().status, TrackStatus::Success);

    // Projection: 2 valid, 2 invalid (track 2 + the un-numbered file).
    let view = partition(rec.registry());
    assert_eq!(view.valid_count(), 2);
    assert_eq!(view.invalid_count(), 2);
    assert_eq!(view.valid_count() + view.invalid_count(), rec.registry().len());
}

#[test]
fn test_malformed_frame_never_corrupts_state() {
    let mut rec = Reconciler::new();
    apply(
        &mut rec,
        "track_analysis",
        r#"{"tracks": [{"track_number": 1, "filename": "a.mp3", "size": 10, "status": "uploaded", "message": ""}]}"#,
    );
    let before = rec.registry().records().to_vec();

    // Missing `tracks` field: parse fails, nothing is applied.
    assert!(StreamEvent::parse("tracks", r#"{"progress": 10}"#).is_err());
    // Wrong type for track_number: likewise.
    assert!(StreamEvent::parse(
        "track_update",
        r#"{"track_number": "one", "status": "success", "message": ""}"#
    )
    .is_err());

    assert_eq!(rec.registry().records(), &before[..]);
}

#[test]
fn test_updates_before_analysis_are_dropped() {
    let mut rec = Reconciler::new();

    // Race: updates arrive before the snapshot.
    let outcome = apply(
        &mut rec,
        "track_update",
        r#"{"track_number": 5, "status": "processing", "message": "Processing...", "progress": 10.0}"#,
    );
    assert!(outcome.changed.is_empty());
    assert!(rec.registry().is_empty());

    // The snapshot then installs the authoritative membership.
    apply(
        &mut rec,
        "track_analysis",
        r#"{"tracks": [{"track_number": 5, "filename": "05.mp3", "size": 9, "status": "uploaded", "message": ""}]}"#,
    );
    assert_eq!(rec.registry().get(5).unwrap().status, TrackStatus::Uploaded);
}
