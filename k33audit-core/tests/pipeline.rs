//! End-to-end batch runs against the in-memory oracle.

use std::{fs, path::PathBuf};

use k33audit_core::{
    AnalysisContext, AnalysisError, AuditError, BatchConfig, BatchDriver, BatchReport, Edge,
    FormatError, Graph, GraphAnalysis, GraphAnalyzer, RecordOutcome, SearchOptions, graph6,
    oracle::{EmbedReply, InMemoryOracle, OracleQuery},
};
use k33audit_test_support::{
    fixtures::{K5_GRAPH6, K33_GRAPH6, TRIANGLE_GRAPH6, collection},
    tracing::RecordingLayer,
};
use rstest::{fixture, rstest};
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

/// Embeds like a real engine would for K5 and its subgraphs, except that the
/// K3,3 only surfaces once edge {2, 4} is gone.
fn masking_oracle() -> InMemoryOracle {
    InMemoryOracle::new().with_embed_rule(|graph: &Graph| {
        let k5 = graph6::decode(K5_GRAPH6).unwrap_or_default();
        if *graph == k5 {
            EmbedReply::Nonplanar(k5)
        } else if graph.order() == 5 && !graph.has_arc(2, 4) && graph.edge_count() == 9 {
            EmbedReply::Nonplanar(graph6::decode(K33_GRAPH6).unwrap_or_default())
        } else {
            EmbedReply::Planar
        }
    })
}

fn k5_oracle() -> InMemoryOracle {
    InMemoryOracle::new().with_embed_rule(|graph: &Graph| {
        if graph.edge_count() == 10 {
            EmbedReply::Nonplanar(graph.clone())
        } else {
            EmbedReply::Planar
        }
    })
}

fn complete(order: usize) -> Graph {
    let mut graph = Graph::new(order);
    for v in 1..order {
        for u in 0..v {
            graph.add_edge(u, v).expect("fresh edge");
        }
    }
    graph
}

#[fixture]
fn workspace() -> TempDir {
    TempDir::new().expect("temp dir")
}

fn run(workspace: &TempDir, body: &str, oracle: &InMemoryOracle) -> BatchReport {
    let input = workspace.path().join("n5.g6");
    fs::write(&input, body).expect("write collection");
    BatchDriver::new(
        BatchConfig::new(&input).with_output_root(workspace.path().join("results")),
        oracle,
    )
    .run()
    .expect("batch runs")
}

#[rstest]
fn k5_collection_yields_a_negative_verdict(workspace: TempDir) {
    let oracle = k5_oracle();
    let report = run(&workspace, &collection(&[K5_GRAPH6], true), &oracle);

    let record = report.records().first().expect("one record");
    let RecordOutcome::Analysed(GraphAnalysis::EdgeDeletion(verdict)) = &record.outcome else {
        panic!("expected edge-deletion analysis, got {:?}", record.outcome);
    };
    assert!(!verdict.missed_k33());
    assert_eq!(verdict.trials().len(), 10);
    assert!(!record.retained);
    assert!(!record.dir.exists());
    assert_eq!(oracle.count(OracleQuery::PlanarEmbed), 11);
}

#[rstest]
fn masked_k33_is_found_and_kept(workspace: TempDir) {
    let oracle = masking_oracle();
    let report = run(
        &workspace,
        &collection(&[TRIANGLE_GRAPH6, K5_GRAPH6], false),
        &oracle,
    );

    assert_eq!(report.analysed(), 2);
    assert_eq!(report.missed(), 1);
    let record = report.records().get(1).expect("second record");
    assert_eq!(record.record, 2);
    assert!(record.retained);
    let RecordOutcome::Analysed(GraphAnalysis::EdgeDeletion(verdict)) = &record.outcome else {
        panic!("expected edge-deletion analysis");
    };
    assert_eq!(verdict.evidence(), vec![Edge::new(2, 4)]);
    let trial = verdict
        .trials()
        .iter()
        .find(|trial| trial.edge == Edge::new(2, 4))
        .expect("trial for {2, 4}");
    assert_eq!(
        trial.graph_file,
        record.dir.join("n5.g6.2.rem2-4.AdjList.out.txt")
    );
    assert!(trial.graph_file.is_file());
}

#[rstest]
fn repeated_runs_agree(workspace: TempDir) {
    let oracle = masking_oracle();
    let body = collection(&[K5_GRAPH6, TRIANGLE_GRAPH6, K5_GRAPH6], true);
    let verdicts = |report: &BatchReport| -> Vec<Option<GraphAnalysis>> {
        report
            .records()
            .iter()
            .map(|record| match &record.outcome {
                RecordOutcome::Analysed(analysis) => Some(analysis.clone()),
                RecordOutcome::Failed(_) => None,
            })
            .collect()
    };
    let first = verdicts(&run(&workspace, &body, &oracle));
    let second = verdicts(&run(&workspace, &body, &oracle));
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[rstest]
fn instrumentation_hangs_off_the_analysis_span(workspace: TempDir) {
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let oracle = masking_oracle();
    let report = tracing::subscriber::with_default(subscriber, || {
        run(&workspace, &collection(&[K5_GRAPH6], false), &oracle)
    });
    assert_eq!(report.missed(), 1);

    let searches = layer.spans_named("search.edge_deletion");
    let search = searches.first().expect("search span");
    assert_eq!(search.parent.as_deref(), Some("analysis"));
    assert_eq!(search.fields.get("trials").map(String::as_str), Some("10"));
    assert_eq!(
        search.fields.get("missed_k33").map(String::as_str),
        Some("true")
    );

    let analyses = layer.spans_named("analysis");
    let analysis = analyses.first().expect("analysis span");
    assert_eq!(analysis.parent.as_deref(), Some("batch.run"));
    assert_eq!(analysis.fields.get("record").map(String::as_str), Some("1"));

    assert!(
        layer
            .events_at(Level::ERROR)
            .iter()
            .any(|event| event.message().contains("edge-deletion analysis found"))
    );
}

#[rstest]
fn failures_are_logged_with_record_context(workspace: TempDir) {
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let oracle = InMemoryOracle::new();
    let report = tracing::subscriber::with_default(subscriber, || {
        run(&workspace, "D~{\n:bad\n", &oracle)
    });
    assert_eq!(report.failed(), 1);
    let failed = layer
        .events_at(Level::ERROR)
        .into_iter()
        .find(|event| event.message() == "record analysis failed")
        .expect("failure event");
    assert_eq!(failed.fields.get("record").map(String::as_str), Some("2"));
    assert_eq!(
        failed.fields.get("code").map(String::as_str),
        Some("AUDIT_FORMAT")
    );
}

#[rstest]
fn one_based_adjacency_lists_are_rejected(workspace: TempDir) {
    let path: PathBuf = workspace.path().join("one.AdjList.out.txt");
    fs::write(&path, "N=2\n1: 2 0\n2: 1 0\n").expect("write list");
    let oracle = InMemoryOracle::new();
    let err = GraphAnalyzer::new(&oracle)
        .with_search_options(SearchOptions::new())
        .analyze(&AnalysisContext::new(workspace.path()), &path)
        .expect_err("one-based list");
    assert!(matches!(
        err,
        AuditError::Analysis {
            source: AnalysisError::OneBasedIndices,
            ..
        }
    ));
}

#[rstest]
fn missing_header_names_the_file(workspace: TempDir) {
    let path = workspace.path().join("headless.AdjList.out.txt");
    fs::write(&path, "0: 1 -1\n1: 0 -1\n").expect("write list");
    let err = k33audit_core::adjacency::read_graph(&path).expect_err("no header");
    assert!(matches!(
        &err,
        AuditError::Format {
            source: FormatError::MissingHeader,
            ..
        }
    ));
    assert!(err.to_string().contains("headless.AdjList.out.txt"));
}

#[test]
fn fixture_records_match_the_codec() {
    let mut k33 = Graph::new(6);
    for u in 0..3 {
        for v in 3..6 {
            k33.add_edge(u, v).expect("fresh edge");
        }
    }
    assert_eq!(graph6::encode(&complete(5)), K5_GRAPH6);
    assert_eq!(graph6::encode(&k33), K33_GRAPH6);
    assert_eq!(graph6::encode(&complete(3)), TRIANGLE_GRAPH6);
}

#[rstest]
fn k5_minus_an_edge_is_planar(workspace: TempDir) {
    let mut graph = complete(5);
    graph.delete_edge(0, 1).expect("edge of K5");
    let record = graph6::encode(&graph);
    let report = run(&workspace, &collection(&[&record], false), &k5_oracle());
    let analysed = report.records().first().expect("one record");
    assert!(matches!(
        analysed.outcome,
        RecordOutcome::Analysed(GraphAnalysis::Planar)
    ));
    assert!(!analysed.retained);
}
