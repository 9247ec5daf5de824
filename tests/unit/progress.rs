use super::*;

#[test]
fn compile_share_is_capped_below_completion() {
    let mut log: Vec<ProgressUpdate> = Vec::new();
    let mut p = ProgressTracker::new(&mut log);
    for done in 1..=4 {
        p.scene_finished(done, 4, format!("scene {done}"));
    }
    assert!((p.fraction() - COMPILE_SHARE).abs() < 1e-12);
    drop(p);
    assert_eq!(log.len(), 4);
    assert!((log[1].fraction - COMPILE_SHARE / 2.0).abs() < 1e-12);
    assert!(log.iter().all(|u| u.stage == Stage::Compile && u.fraction < 1.0));
}

#[test]
fn only_finish_reaches_one() {
    let mut log: Vec<ProgressUpdate> = Vec::new();
    let mut p = ProgressTracker::new(&mut log);
    p.scene_finished(1, 1, "scene 1");
    p.stage_finished(Stage::Assemble);
    p.stage_finished(Stage::Mix);
    p.stage_finished(Stage::Export);
    assert!(p.fraction() < 1.0);
    p.finish("done");
    drop(p);

    let fractions: Vec<f64> = log.iter().map(|u| u.fraction).collect();
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(fractions.iter().filter(|f| **f >= 1.0).count(), 1);
    assert_eq!(log.last().unwrap().stage, Stage::Done);
}

#[test]
fn regressing_updates_are_held_at_the_previous_value() {
    let mut log: Vec<ProgressUpdate> = Vec::new();
    let mut p = ProgressTracker::new(&mut log);
    p.stage_finished(Stage::Mix);
    p.scene_finished(1, 10, "late scene report");
    drop(p);
    assert_eq!(log[1].fraction, log[0].fraction);
}

#[test]
fn empty_scene_list_fills_compile_share() {
    let mut p_log: Vec<ProgressUpdate> = Vec::new();
    let mut p = ProgressTracker::new(&mut p_log);
    p.scene_finished(0, 0, "nothing to compile");
    assert!((p.fraction() - COMPILE_SHARE).abs() < 1e-12);
}
