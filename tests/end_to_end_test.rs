use biathlon::{
    parse_line, BiathlonError, CompetitionConfig, Engine, ReportRow, Status, WriterSink,
};
use std::io::Write;
use tempfile::NamedTempFile;

/// Run raw lines through the whole pipeline, returning the audit log and rows
fn run(config: CompetitionConfig, lines: &[&str]) -> (String, Vec<ReportRow>) {
    let mut engine = Engine::builder()
        .with_config(config)
        .with_sink(WriterSink::new(Vec::new()))
        .build()
        .unwrap();
    for line in lines {
        engine.process_event(parse_line(line).unwrap()).unwrap();
    }
    engine.finalize().unwrap();
    let rows = engine.report().unwrap();
    let log = String::from_utf8(engine.into_sink().into_inner()).unwrap();
    (log, rows)
}

#[test]
fn test_single_lap_finisher() {
    let (log, rows) = run(
        CompetitionConfig::new(1, 1000.0, 150.0),
        &[
            "[10:00:00.000] 1 1",
            "[10:00:00.000] 2 1 10:00:30.000",
            "[10:00:30.000] 4 1",
            "[10:05:00.000] 10 1",
        ],
    );

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, Status::Finished);
    assert_eq!(rows[0].laps.len(), 1);
    assert_eq!(rows[0].laps[0].duration.num_milliseconds(), 270_000);
    assert_eq!(rows[0].laps[0].speed, 1000.0 / 270.0);
    assert_eq!(
        rows[0].to_string(),
        "[Finished] 1 [{04:30.000, 3.704}] {00:00.000, 0.000} 0/0"
    );

    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(
        lines,
        vec![
            "[10:00:00.000] The competitor(1) registered",
            "[10:00:00.000] The start time for the competitor(1) was set by a draw to 10:00:30.000",
            "[10:00:30.000] The competitor(1) has started",
            "[10:05:00.000] The competitor(1) ended the main lap",
            "[10:05:00.000] The competitor(1) has finished",
        ]
    );
}

#[test]
fn test_drawn_but_never_started() {
    let (log, rows) = run(
        CompetitionConfig::new(1, 1000.0, 150.0),
        &["[10:00:00.000] 1 1", "[10:00:00.000] 2 1 10:00:30.000"],
    );

    assert_eq!(rows[0].status, Status::NotStarted);
    assert_eq!(
        log.lines().last(),
        Some("[10:00:30.000] The competitor(1) is disqualified")
    );
}

#[test]
fn test_penalty_scenario() {
    let (_, rows) = run(
        CompetitionConfig::new(1, 1000.0, 150.0),
        &[
            "[10:00:00.000] 2 1 10:00:00.000",
            "[10:00:00.000] 4 1",
            "[10:02:00.000] 5 1 1",
            "[10:02:01.000] 6 1 1",
            "[10:02:02.000] 6 1 2",
            "[10:02:03.000] 6 1 3",
            "[10:02:10.000] 7 1",
            "[10:02:20.000] 8 1",
            "[10:02:25.000] 9 1",
        ],
    );

    let row = &rows[0];
    assert_eq!(row.penalty.duration.num_milliseconds(), 5_000);
    assert_eq!(row.penalty.speed, 150.0 * 2.0 / 5.0);
    assert_eq!((row.hits, row.shots), (3, 5));
}

#[test]
fn test_competitor_lost_in_the_forest() {
    let config = CompetitionConfig::new(2, 3651.0, 50.0).with_firing_lines(1);
    let (log, rows) = run(
        config,
        &[
            "[09:05:59.867] 1 1",
            "[09:15:00.841] 2 1 09:30:00.000",
            "[09:29:45.734] 3 1",
            "[09:30:01.005] 4 1",
            "[09:49:31.659] 5 1 1",
            "[09:49:33.123] 6 1 1",
            "[09:49:34.650] 6 1 2",
            "[09:49:35.937] 6 1 4",
            "[09:49:37.364] 6 1 5",
            "[09:49:38.339] 7 1",
            "[09:49:55.915] 8 1",
            "[09:51:48.391] 9 1",
            "[09:59:03.872] 10 1",
            "[09:59:03.872] 11 1 Lost in the forest",
        ],
    );

    assert_eq!(
        rows[0].to_string(),
        format!(
            "[NotFinished] 1 [{{29:03.872, {:.3}}}] {{01:52.476, {:.3}}} 4/5",
            3651.0 / 1743.872,
            50.0 / 112.476
        )
    );
    assert!(log.ends_with("[09:59:03.872] The competitor(1) can`t continue: Lost in the forest\n"));
    assert!(!log.contains("disqualified"));
    assert!(!log.contains("has finished"));
}

#[test]
fn test_malformed_draw_aborts() {
    let mut engine = Engine::new(
        CompetitionConfig::new(1, 1000.0, 150.0),
        WriterSink::new(Vec::new()),
    );
    let result = engine.process_event(parse_line("[10:00:00.000] 2 1 10:00").unwrap());
    assert!(matches!(result, Err(BiathlonError::Validation(_))));
}

#[test]
fn test_load_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"laps": 2, "lapLen": 3651, "penaltyLen": 50, "firingLines": 1, "start": "09:30:00", "startDelta": "00:00:30"}}"#
    )
    .unwrap();

    let config = CompetitionConfig::load(file.path()).unwrap();
    assert_eq!(config.laps, 2);
    assert_eq!(config.expected_bouts(), 2);
}

#[test]
fn test_load_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = CompetitionConfig::load(dir.path().join("missing.json"));
    assert!(matches!(result, Err(BiathlonError::Io(_))));
}

#[test]
fn test_load_invalid_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"laps": 0, "lapLen": 1, "penaltyLen": 1, "start": "09:30:00", "startDelta": "00:00:30"}}"#).unwrap();
    assert!(matches!(
        CompetitionConfig::load(file.path()),
        Err(BiathlonError::Config(_))
    ));
}
