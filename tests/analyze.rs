use std::fs;
use tempfile::tempdir;
use toehold::{
    AnalysisPipeline, ErrorKind, ToeholdError,
    accessibility::FixedProfile,
    config::ToeholdConfig,
    export::write_ranked_csv,
    store::ResultStore,
};

const TARGET: &str = "AUGCGAUCGAUCGAUGCUAC";

#[test]
fn ranked_report_from_fixed_profile() {
    let values = (0..TARGET.len())
        .map(|i| if i < 10 { 0.1 } else { 0.9 })
        .collect();
    let pipeline =
        AnalysisPipeline::new(ToeholdConfig::default(), FixedProfile::new(values).unwrap())
            .unwrap();
    let report = pipeline.analyze(TARGET, 15).unwrap();
    let offsets: Vec<usize> = report
        .candidates
        .iter()
        .map(|c| c.candidate.offset)
        .collect();
    assert_eq!(offsets, vec![5, 4, 3, 2, 1, 0]);
    for scored in &report.candidates {
        assert_eq!(scored.candidate.target.len(), 15);
        assert!(scored.candidate.toehold.contains(&scored.candidate.target));
        assert!((scored.accessibility + scored.defect - 1.0).abs() < 1e-12);
    }

    let mut store = ResultStore::default();
    let run_id = store.insert(report);
    let summary = store.summary(&run_id).unwrap();
    assert_eq!(summary.candidates[0].rank, 1);
    assert_eq!(summary.candidates[0].offset, 5);

    let mut csv = Vec::new();
    write_ranked_csv(&store.get(&run_id).unwrap().report, &mut csv).unwrap();
    assert_eq!(String::from_utf8(csv).unwrap().lines().count(), 7);
}

#[test]
fn lowercase_dna_input_is_normalized() {
    let pipeline = AnalysisPipeline::new(
        ToeholdConfig::default(),
        FixedProfile::uniform(0.5, 8).unwrap(),
    )
    .unwrap();
    let report = pipeline.analyze("acgtacgt", 4).unwrap();
    assert_eq!(report.sequence.as_str(), "ACGUACGU");
    assert_eq!(report.candidates.len(), 5);
}

#[test]
fn invalid_input_is_reported_before_tool_runs() {
    let td = tempdir().unwrap();
    let err = toehold::analyze("ACGZ", 2, td.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(matches!(
        err.root_cause(),
        ToeholdError::InvalidBase { base: 'Z', position: 3 }
    ));
    let err = toehold::analyze("", 2, td.path()).unwrap_err();
    assert!(matches!(err.root_cause(), ToeholdError::EmptySequence));
}

#[cfg(unix)]
mod fake_pairs_tool {
    use super::*;
    use std::path::Path;

    const UNIFORM: &str = r#"for last; do :; done
seq=$(head -n 1 "$last.in")
n=${#seq}
out="$last.ppairs"
echo "$n" > "$out"
i=1
while [ "$i" -le "$n" ]; do
  printf '%d\t%d\t0.75\n' "$i" $((n + 1)) >> "$out"
  i=$((i + 1))
done
"#;

    fn config_for(script: &Path, workdir: &Path) -> ToeholdConfig {
        let mut config = ToeholdConfig::with_workdir(workdir);
        config.tool.executable = Some("sh".to_string());
        config.tool.args = vec![script.to_string_lossy().to_string()];
        config.tool.poll_interval_ms = 10;
        config
    }

    #[test]
    fn pipeline_runs_external_tool() {
        let td = tempdir().unwrap();
        let script = td.path().join("pairs.sh");
        fs::write(&script, UNIFORM).unwrap();
        let workdir = td.path().join("work");
        let pipeline = AnalysisPipeline::with_pairs_tool(config_for(&script, &workdir)).unwrap();
        let report = pipeline.analyze(TARGET, 15).unwrap();
        assert_eq!(report.candidates.len(), 6);
        assert!(
            report
                .candidates
                .iter()
                .all(|c| (c.accessibility - 0.75).abs() < 1e-12)
        );
        assert_eq!(fs::read_dir(&workdir).unwrap().count(), 0);
    }

    #[test]
    fn concurrent_analyses_do_not_collide() {
        let td = tempdir().unwrap();
        let script = td.path().join("pairs.sh");
        fs::write(&script, UNIFORM).unwrap();
        let shared = td.path().join("shared");
        let pipeline = AnalysisPipeline::with_pairs_tool(config_for(&script, &shared)).unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let pipeline = &pipeline;
                    let own = td.path().join(format!("own-{i}"));
                    let script = &script;
                    scope.spawn(move || {
                        let shared_report = pipeline.analyze(TARGET, 10).unwrap();
                        let own_pipeline =
                            AnalysisPipeline::with_pairs_tool(config_for(script, &own)).unwrap();
                        let own_report = own_pipeline.analyze(TARGET, 10).unwrap();
                        assert_eq!(fs::read_dir(&own).unwrap().count(), 0);
                        (shared_report.candidates.len(), own_report.candidates.len())
                    })
                })
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), (11, 11));
            }
        });
        assert_eq!(fs::read_dir(&shared).unwrap().count(), 0);
    }

    #[test]
    fn tool_failure_surfaces_as_pipeline_failure() {
        let td = tempdir().unwrap();
        let script = td.path().join("pairs.sh");
        fs::write(&script, "exit 2\n").unwrap();
        let pipeline =
            AnalysisPipeline::with_pairs_tool(config_for(&script, &td.path().join("work")))
                .unwrap();
        let err = pipeline.analyze(TARGET, 15).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PipelineFailure);
        assert!(matches!(
            err.root_cause(),
            ToeholdError::ToolFailed {
                status: Some(2),
                ..
            }
        ));
    }
}
