//! Study session control

use std::time::Duration;

use alerting::{AlertConfig, AlertDecision, AlertGate};
use attention::{AttentionConfig, AttentionEngine, FrameAnalysis, FrameObservation, SessionTotals};
use chrono::NaiveDateTime;
use serde::Serialize;
use storage::SessionRecord;
use tracing::{info, warn};

use crate::pomodoro::{format_remaining, PomodoroTimer};
use crate::source::ObservationSource;
use crate::SessionError;

/// What the UI shows after one frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub analysis: FrameAnalysis,
    /// Alerts emitted and advisories shown this frame
    pub alerts: AlertDecision,
    /// Totals including alerts counted this frame
    pub totals: SessionTotals,
    /// Session time of this frame
    pub session_time: Duration,
    /// Pomodoro countdown (`mm:ss`) while one is running
    pub pomodoro_remaining: Option<String>,
    /// A pomodoro finished on this frame
    pub pomodoro_completed: bool,
}

impl FrameReport {
    /// Whether the alert sound should play
    pub fn audible(&self) -> bool {
        self.alerts.audible() || self.pomodoro_completed
    }

    /// Status line, e.g. "Focused: 12.0s | Drowsy: 0.0s | Distracted: 3.1s | Focus: 79.5%"
    pub fn status_line(&self) -> String {
        format!(
            "Focused: {:.1}s | Drowsy: {:.1}s | Distracted: {:.1}s | Focus: {:.1}%",
            self.totals.focused_seconds,
            self.totals.drowsy_seconds,
            self.totals.distracted_seconds,
            self.totals.focus_percent()
        )
    }
}

/// One running study session
pub struct StudySession {
    username: String,
    started_at: NaiveDateTime,
    engine: AttentionEngine,
    gate: AlertGate,
    pomodoro: PomodoroTimer,
    first_timestamp_ns: Option<u64>,
    now: Duration,
}

impl StudySession {
    /// Start a session; fails before any state exists if the engine
    /// configuration is unusable
    pub fn start(
        username: impl Into<String>,
        started_at: NaiveDateTime,
        attention: AttentionConfig,
        alerts: AlertConfig,
        pomodoro: Duration,
    ) -> Result<Self, SessionError> {
        let engine = AttentionEngine::new(attention)?;
        let gate = AlertGate::new(alerts)?;
        let username = username.into();
        info!("Study session started for {} at {}", username, started_at);
        Ok(Self {
            username,
            started_at,
            engine,
            gate,
            pomodoro: PomodoroTimer::new(pomodoro),
            first_timestamp_ns: None,
            now: Duration::ZERO,
        })
    }

    /// Begin a pomodoro at the current session time
    pub fn start_pomodoro(&mut self) -> bool {
        self.pomodoro.start(self.now)
    }

    pub fn pomodoro_running(&self) -> bool {
        self.pomodoro.is_running()
    }

    /// Process one observation: analyze, gate alerts, count emissions
    pub fn process(&mut self, observation: &FrameObservation) -> FrameReport {
        let first = *self.first_timestamp_ns.get_or_insert(observation.timestamp_ns);
        self.now = self
            .now
            .max(Duration::from_nanos(observation.timestamp_ns.saturating_sub(first)));

        let analysis = self.engine.process(observation);
        metrics::counter!("attention_frames_total", "state" => analysis.classification.as_str())
            .increment(1);

        let alerts = self.gate.evaluate(&analysis.signals, self.now);
        for kind in &alerts.emitted {
            self.engine.record_alert();
            metrics::counter!("attention_alerts_emitted_total", "kind" => kind.as_str())
                .increment(1);
        }

        let pomodoro_completed = self.pomodoro.poll(self.now);
        let pomodoro_remaining = self.pomodoro.remaining(self.now).map(format_remaining);

        FrameReport {
            totals: self.engine.totals(),
            analysis,
            alerts,
            session_time: self.now,
            pomodoro_remaining,
            pomodoro_completed,
        }
    }

    /// Drive the session until the source runs dry.
    ///
    /// A failing source ends the loop with its error; the session itself is
    /// still intact and can be finished by the caller.
    pub fn run<S, F>(&mut self, source: &mut S, mut on_frame: F) -> Result<u64, SessionError>
    where
        S: ObservationSource + ?Sized,
        F: FnMut(&FrameReport),
    {
        let mut frames = 0;
        loop {
            let observation = match source.next_observation() {
                Ok(Some(observation)) => observation,
                Ok(None) => return Ok(frames),
                Err(e) => {
                    warn!("Frame source failed after {} frames: {}", frames, e);
                    return Err(e);
                }
            };
            let report = self.process(&observation);
            on_frame(&report);
            frames += 1;
        }
    }

    pub fn totals(&self) -> SessionTotals {
        self.engine.totals()
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Stop the session and produce the record to persist
    pub fn finish(mut self, ended_at: NaiveDateTime) -> SessionRecord {
        self.pomodoro.stop();
        let totals = self.engine.finish();
        info!("Study session for {} stopped at {}", self.username, ended_at);

        SessionRecord {
            id: 0,
            username: self.username,
            start_time: self.started_at,
            end_time: ended_at,
            focused_seconds: totals.focused_seconds as i64,
            distracted_seconds: totals.distracted_seconds as i64,
            drowsy_seconds: totals.drowsy_seconds as i64,
            alerts: i64::from(totals.alert_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::AlertKind;
    use attention::{Classification, FaceDetection, LandmarkSet, Point};
    use chrono::NaiveDate;

    const FRAME_NS: u64 = 1_000_000_000 / 30;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 2)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn session() -> StudySession {
        StudySession::start(
            "tester",
            at(10, 0, 0),
            AttentionConfig::default(),
            AlertConfig::default(),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    /// Upright face; `closed` squeezes both eyes shut
    fn face(closed: bool) -> FaceDetection {
        let mut points = vec![Point::new(100, 100); 68];
        points[8] = Point::new(100, 200);
        points[30] = Point::new(100, 120);
        let half = if closed { 1 } else { 3 };
        for (start, x) in [(36, 60), (42, 120)] {
            points[start] = Point::new(x, 80);
            points[start + 1] = Point::new(x + 6, 80 - half);
            points[start + 2] = Point::new(x + 14, 80 - half);
            points[start + 3] = Point::new(x + 20, 80);
            points[start + 4] = Point::new(x + 14, 80 + half);
            points[start + 5] = Point::new(x + 6, 80 + half);
        }
        points[48] = Point::new(80, 160);
        points[54] = Point::new(120, 160);
        let landmarks = LandmarkSet::new(points).unwrap();
        FaceDetection {
            bbox: landmarks.bounding_box(),
            landmarks,
        }
    }

    fn observation(index: u64, face: Option<FaceDetection>) -> FrameObservation {
        FrameObservation {
            timestamp_ns: index * FRAME_NS,
            face,
            emotion: None,
        }
    }

    #[test]
    fn test_invalid_config_fails_at_start() {
        let result = StudySession::start(
            "tester",
            at(10, 0, 0),
            AttentionConfig {
                eye_ar_consec_frames: 0,
                ..Default::default()
            },
            AlertConfig::default(),
            Duration::from_secs(60),
        );
        assert!(matches!(result, Err(SessionError::Attention(_))));

        let result = StudySession::start(
            "tester",
            at(10, 0, 0),
            AttentionConfig::default(),
            AlertConfig {
                cooldown_seconds: f64::INFINITY,
            },
            Duration::from_secs(60),
        );
        assert!(matches!(result, Err(SessionError::Alert(_))));
    }

    #[test]
    fn test_sustained_drowsiness_is_rate_limited() {
        let mut session = session();
        let mut emitted = Vec::new();
        // 7 seconds of closed eyes at 30fps
        for i in 0..210 {
            let report = session.process(&observation(i, Some(face(true))));
            if !report.alerts.emitted.is_empty() {
                emitted.push((i, report.alerts.emitted.clone()));
            }
        }
        // Rises on frame 6 (index 5), then again once more than 5s have passed
        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[0], (5, vec![AlertKind::Drowsy]));
        assert!(emitted[1].0 > 5 + 150);
        assert_eq!(session.totals().alert_count, 2);
    }

    #[test]
    fn test_posture_is_not_counted() {
        let mut session = session();
        for i in 0..10 {
            let report = session.process(&observation(i, None));
            assert_eq!(report.analysis.classification, Classification::Distracted);
            assert_eq!(report.alerts.advisories, vec![AlertKind::Posture]);
            assert!(!report.audible());
        }
        let record = session.finish(at(10, 0, 1));
        assert_eq!(record.alerts, 0);
        assert_eq!(record.distracted_seconds, 0);
    }

    #[test]
    fn test_finish_builds_record() {
        let mut session = session();
        for i in 0..95 {
            session.process(&observation(i, Some(face(false))));
        }
        let report = session.process(&observation(95, Some(face(false))));
        assert!(report.status_line().starts_with("Focused: 3.2s"));

        let record = session.finish(at(10, 0, 4));
        assert_eq!(record.username, "tester");
        assert_eq!(record.start_time, at(10, 0, 0));
        assert_eq!(record.end_time, at(10, 0, 4));
        // 96 frames at 1/30s = 3.2s, stored truncated
        assert_eq!(record.focused_seconds, 3);
        assert_eq!(record.drowsy_seconds, 0);
        assert_eq!(record.alerts, 0);
    }

    #[test]
    fn test_pomodoro_completion() {
        let mut session = session();
        session.process(&observation(0, Some(face(false))));
        assert!(session.start_pomodoro());
        assert!(session.pomodoro_running());

        let report = session.process(&observation(30, Some(face(false))));
        assert_eq!(report.pomodoro_remaining.as_deref(), Some("00:01"));

        let report = session.process(&observation(61, Some(face(false))));
        assert!(report.pomodoro_completed);
        assert!(report.audible());
        assert_eq!(report.totals.alert_count, 0);
        assert!(!session.pomodoro_running());
    }

    struct Scripted(Vec<Result<Option<FrameObservation>, SessionError>>);

    impl ObservationSource for Scripted {
        fn next_observation(&mut self) -> Result<Option<FrameObservation>, SessionError> {
            if self.0.is_empty() {
                Ok(None)
            } else {
                self.0.remove(0)
            }
        }
    }

    #[test]
    fn test_run_until_exhausted() {
        let mut session = session();
        let mut source = Scripted((0..180).map(|i| Ok(Some(observation(i, Some(face(false)))))).collect());
        let mut seen = 0;
        let frames = session.run(&mut source, |_| seen += 1).unwrap();
        assert_eq!(frames, 180);
        assert_eq!(seen, 180);
        assert!((session.totals().focused_seconds - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_source_failure_keeps_session() {
        let mut session = session();
        let mut source = Scripted(vec![
            Ok(Some(observation(0, None))),
            Err(SessionError::Config("camera unplugged".into())),
        ]);
        assert!(session.run(&mut source, |_| {}).is_err());
        assert!(session.totals().distracted_seconds > 0.0);
        let record = session.finish(at(10, 0, 1));
        assert_eq!(record.username, "tester");
    }
}
