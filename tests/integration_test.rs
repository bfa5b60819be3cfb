use mock_exam_builder::error::RenderError;
use mock_exam_builder::orchestrator::build_units;
use mock_exam_builder::services::partition::{paper_number, theme_prefix};
use mock_exam_builder::services::Estimator;
use mock_exam_builder::{
    App, AssemblyFlow, AssemblyMode, AssemblyUnit, Config, DirectoryRenderer, MockExam, MockKind,
    MockRenderer, Question,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// 只记录、不落盘的渲染器
#[derive(Default)]
struct RecordingRenderer {
    mocks: Mutex<Vec<MockExam>>,
}

impl RecordingRenderer {
    fn mocks(&self) -> Vec<MockExam> {
        self.mocks.lock().unwrap().clone()
    }
}

impl MockRenderer for RecordingRenderer {
    fn render(&self, mock: &MockExam, dir: &Path) -> Result<PathBuf, RenderError> {
        self.mocks.lock().unwrap().push(mock.clone());
        Ok(dir.to_path_buf())
    }
}

/// 第一次渲染失败，之后正常
#[derive(Default)]
struct FlakyRenderer {
    calls: AtomicUsize,
}

impl MockRenderer for FlakyRenderer {
    fn render(&self, _mock: &MockExam, dir: &Path) -> Result<PathBuf, RenderError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(RenderError::Serialize("boom".to_string()));
        }
        Ok(dir.to_path_buf())
    }
}

/// 每次渲染都 panic
struct PanickingRenderer;

impl MockRenderer for PanickingRenderer {
    fn render(&self, _mock: &MockExam, _dir: &Path) -> Result<PathBuf, RenderError> {
        panic!("renderer exploded");
    }
}

fn question(number: &str, marks: u32, topics: &[&str]) -> Question {
    Question {
        question_number: number.to_string(),
        year: "2019".to_string(),
        board: "Edexcel".to_string(),
        qualification: "A-level".to_string(),
        paper: "1".to_string(),
        marks,
        topics: topics.iter().map(|t| t.to_string()).collect(),
        question_doc: None,
        markscheme_doc: None,
        extract_doc: None,
        fingerprint: Some(format!("fp-{}", number)),
    }
}

fn config(seed: u64) -> Config {
    Config {
        shuffle_seed: Some(seed),
        output_folder: PathBuf::from("unused"),
        ..Config::default()
    }
}

#[test]
fn test_small_pool_builds_single_mock_without_packing() {
    let renderer = Arc::new(RecordingRenderer::default());
    let flow = AssemblyFlow::new(&config(1), renderer.clone()).unwrap();

    let unit = AssemblyUnit::topic(
        "1.1 Scarcity",
        vec![question("1", 2, &[]), question("2", 3, &[])],
    );
    let report = flow.run(unit);

    let mocks = renderer.mocks();
    assert_eq!(mocks.len(), 1);
    assert_eq!(mocks[0].name, "mock1");
    assert_eq!(mocks[0].kind, MockKind::Mixed);
    assert_eq!(mocks[0].question_count(), 2);
    assert_eq!(mocks[0].total_minutes, 10);
    assert_eq!(mocks[0].tier, 25);
    assert_eq!(report.leftover, 0);
}

#[test]
fn test_no_question_repeats_across_mocks_of_one_run() {
    let renderer = Arc::new(RecordingRenderer::default());
    let cfg = Config {
        max_mocks_per_topic: 5,
        min_short_mocks: 2,
        ..config(11)
    };
    let flow = AssemblyFlow::new(&cfg, renderer.clone()).unwrap();

    let mut questions: Vec<Question> = (0..30)
        .map(|i| question(&format!("s{}", i), (i % 9) as u32 + 1, &[]))
        .collect();
    for (i, marks) in [10, 12, 14, 20].into_iter().enumerate() {
        questions.push(question(&format!("e{}", i), marks, &[]));
    }
    // 内容相同的副本只能出现一次
    let mut copy = question("s0-copy", 1, &[]);
    copy.fingerprint = Some("fp-s0".to_string());
    questions.push(copy);

    let report = flow.run(AssemblyUnit::topic("2.1 Demand", questions));
    assert_eq!(report.duplicates_removed, 1);

    let estimator = Estimator::default();
    let mocks = renderer.mocks();
    assert!(mocks.len() >= 2);

    let mut seen = HashSet::new();
    for mock in &mocks {
        let essays = mock
            .questions
            .iter()
            .filter(|q| estimator.is_context_based(q))
            .count();
        match mock.kind {
            MockKind::ShortOnly => assert_eq!(essays, 0, "{}", mock.name),
            _ => assert!(essays <= 1, "{}", mock.name),
        }
        assert!(mock.total_minutes <= 35 + 5, "{}", mock.name);
        assert_eq!(mock.total_minutes, estimator.total_minutes(&mock.questions));
        for q in &mock.questions {
            assert!(seen.insert(q.identity_key()), "重复选题 {}", q.label());
        }
    }
    assert_eq!(seen.len(), report.used_keys.len());
    assert!(mocks.iter().any(|m| m.kind == MockKind::ShortOnly));
}

#[test]
fn test_same_seed_gives_same_selection() {
    let questions: Vec<Question> = (0..25)
        .map(|i| question(&format!("q{}", i), (i % 7) as u32 + 1, &[]))
        .collect();

    let run = || {
        let flow = AssemblyFlow::new(&config(99), Arc::new(RecordingRenderer::default())).unwrap();
        flow.run(AssemblyUnit::topic("3.2 Costs", questions.clone()))
            .used_keys
    };

    assert_eq!(run(), run());
}

#[test]
fn test_render_failure_does_not_stop_remaining_mocks() {
    let cfg = Config {
        max_mocks_per_topic: 3,
        min_short_mocks: 0,
        ..config(3)
    };
    let flow = AssemblyFlow::new(&cfg, Arc::new(FlakyRenderer::default())).unwrap();

    let questions: Vec<Question> = (0..30)
        .map(|i| question(&format!("q{}", i), 2, &[]))
        .collect();
    let report = flow.run(AssemblyUnit::topic("1.3 Choice", questions));

    assert_eq!(report.mocks.len(), 3);
    assert_eq!(report.render_failures, 1);
    assert_eq!(report.rendered(), 2);
    assert!(report.mocks[0].output.is_none());
    for mock in &report.mocks {
        assert_eq!(mock.total_minutes, 24);
        assert_eq!(mock.question_count, 6);
    }
}

#[test]
fn test_renderer_panic_is_contained() {
    let flow = AssemblyFlow::new(&config(4), Arc::new(PanickingRenderer)).unwrap();
    let questions: Vec<Question> = (0..10)
        .map(|i| question(&format!("q{}", i), 3, &[]))
        .collect();

    let report = flow.run(AssemblyUnit::topic("1.4 PPF", questions));
    assert!(!report.mocks.is_empty());
    assert_eq!(report.render_failures, report.mocks.len());
}

#[test]
fn test_implausible_marks_do_not_break_assembly() {
    let renderer = Arc::new(RecordingRenderer::default());
    let flow = AssemblyFlow::new(&config(12), renderer.clone()).unwrap();

    let mut questions: Vec<Question> = (0..6)
        .map(|i| question(&format!("q{}", i), 2, &[]))
        .collect();
    questions.push(question("huge", u32::MAX, &[]));
    questions.push(question("big", 3_000_000_000, &[]));

    let report = flow.run(AssemblyUnit::topic("5.1 Money", questions));

    let mocks = renderer.mocks();
    assert_eq!(mocks.len(), 1);
    assert_eq!(mocks[0].total_minutes, 24);
    assert!(mocks[0].questions.iter().all(|q| q.marks == 2));
    assert_eq!(report.leftover, 2);
}

#[test]
fn test_empty_unit_is_skipped() {
    let renderer = Arc::new(RecordingRenderer::default());
    let flow = AssemblyFlow::new(&config(5), renderer.clone()).unwrap();
    let report = flow.run(AssemblyUnit::topic("4.1 Trade", Vec::new()));
    assert!(report.skipped.is_some());
    assert!(renderer.mocks().is_empty());
}

#[test]
fn test_theme_unit_mocks_respect_eligibility() {
    let renderer = Arc::new(RecordingRenderer::default());
    let cfg = Config {
        mode: AssemblyMode::Unit,
        themes: vec![3],
        max_mocks_per_topic: 4,
        ..config(8)
    };
    let flow = AssemblyFlow::new(&cfg, renderer.clone()).unwrap();

    let mut questions = Vec::new();
    for i in 0..40u32 {
        let tag = if i % 2 == 0 { "3.2.1 Costs" } else { "3.4.2 Labour" };
        let mut q = question(&format!("t{}", i), i % 12 + 1, &[tag]);
        q.paper = match i % 3 {
            0 => "1".to_string(),
            1 => "Paper 2".to_string(),
            _ => "Paper 3".to_string(),
        };
        questions.push(q);
    }
    questions.push(question("other", 4, &["1.1 Scarcity"]));

    let units = build_units(&questions, &cfg);
    assert_eq!(units.len(), 1);
    let report = flow.run(units.into_iter().next().unwrap());
    assert!(report.rejected > 0);

    let mocks = renderer.mocks();
    assert!(!mocks.is_empty());
    for mock in &mocks {
        assert_eq!(mock.kind, MockKind::Unit);
        assert!(mock.name.starts_with("topic mock"));
        assert!(mock.total_minutes <= 40 + 5);
        assert!(!mock.sections.is_empty());
        for q in &mock.questions {
            assert!(q.marks < 10);
            assert!(q.topics.iter().any(|t| theme_prefix(t) == Some(3)));
            let paper = paper_number(&q.paper).unwrap();
            assert!(paper == "1" || paper == "3", "paper {}", q.paper);
        }
    }
}

#[tokio::test]
async fn test_app_run_writes_mock_directories() {
    let dir = tempfile::tempdir().unwrap();
    let bank_dir = dir.path().join("bank");
    let out_dir = dir.path().join("out");
    std::fs::create_dir_all(bank_dir.join("docs")).unwrap();
    std::fs::write(bank_dir.join("docs/ms.pdf"), b"markscheme").unwrap();

    let mut toml = String::new();
    let mut add = |number: &str, marks: u32, topic: &str| {
        let doc = format!("docs/{}.pdf", number);
        std::fs::write(bank_dir.join(&doc), format!("question {}", number)).unwrap();
        toml.push_str(&format!(
            "[[questions]]\nquestion_number = \"{}\"\nyear = 2019\nboard = \"AQA\"\npaper = \"1\"\nmarks = {}\ntopics = [\"{}\"]\nquestion_doc = \"{}\"\nmarkscheme_doc = \"docs/ms.pdf\"\n\n",
            number, marks, topic, doc
        ));
    };
    add("a1", 5, "1.1 Scarcity");
    add("a2", 5, "1.1 Scarcity");
    for i in 0..10 {
        add(&format!("b{}", i), 3, "1.2 Choice");
    }
    std::fs::write(bank_dir.join("bank.toml"), toml).unwrap();

    let cfg = Config {
        question_folder: bank_dir,
        output_folder: out_dir.clone(),
        output_log_file: dir.path().join("log.txt"),
        mode: AssemblyMode::Topic,
        sequential_threshold: 0,
        max_concurrent_units: 2,
        ..config(5)
    };

    let app = App::initialize(cfg, Arc::new(DirectoryRenderer::new())).unwrap();
    let stats = app.run().await.unwrap();

    assert_eq!(stats.units, 2);
    assert_eq!(stats.skipped, 0);
    assert_eq!(stats.render_failures, 0);
    assert_eq!(stats.mocks_rendered, 3);

    assert!(out_dir.join("1.1 Scarcity/mock1/cover.toml").exists());
    assert!(out_dir.join("1.2 Choice/mock1/manifest.json").exists());
    assert!(out_dir
        .join("1.2 Choice/short questions mock/questions/index.txt")
        .exists());
    let markschemes: Vec<_> = std::fs::read_dir(out_dir.join("1.2 Choice/mock1/markschemes"))
        .unwrap()
        .collect();
    assert_eq!(markschemes.len(), 1);

    let log = std::fs::read_to_string(dir.path().join("log.txt")).unwrap();
    assert!(log.contains("1.2 Choice | 模拟卷 2"));
}

#[test]
fn test_sequential_path_matches_unit_order() {
    let cfg = Config {
        output_log_file: std::env::temp_dir().join("mock_exam_builder_seq_log.txt"),
        sequential_threshold: 10,
        ..config(6)
    };
    let app = App::initialize(cfg, Arc::new(RecordingRenderer::default())).unwrap();
    let units = vec![
        AssemblyUnit::topic("b", vec![question("1", 2, &[])]),
        AssemblyUnit::topic("a", Vec::new()),
    ];

    let reports = tokio_test::block_on(app.process_units(units)).unwrap();
    assert_eq!(reports[0].label, "b");
    assert_eq!(reports[0].mocks.len(), 1);
    assert!(reports[1].skipped.is_some());
}
