use anyhow::{Result, anyhow};
use gastos_core::{Category, ClassificationCache, GastosError, KeywordMatcher, Source, Taxonomy};
use gastos_engine::{BatchSettings, Classifier, CompletionRequest, CompletionService, ExportOptions};
use gastos_ingest::{Format, parse_table};
use std::cell::RefCell;
use std::collections::HashMap;

/// Answers from a description → label table, one numbered line per item.
/// Requests listed in `fail_on` (0-based) return a transport error instead.
struct Scripted {
    answers: HashMap<&'static str, &'static str>,
    fail_on: Vec<usize>,
    /// Drop this many lines from the end of every reply.
    truncate: usize,
    prompts: RefCell<Vec<String>>,
}

impl Scripted {
    fn new(answers: &[(&'static str, &'static str)]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            fail_on: Vec::new(),
            truncate: 0,
            prompts: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.prompts.borrow().len()
    }

    /// Descriptions of every request, in order.
    fn requested(&self) -> Vec<Vec<String>> {
        self.prompts.borrow().iter().map(|p| items_in(p)).collect()
    }
}

fn items_in(prompt: &str) -> Vec<String> {
    let list = prompt.split("Movimientos:\n").nth(1).unwrap_or("");
    list.lines()
        .filter_map(|l| l.split_once(". ").map(|(_, d)| d.to_string()))
        .collect()
}

impl CompletionService for Scripted {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
        let call = self.calls();
        self.prompts.borrow_mut().push(request.prompt.to_string());
        if self.fail_on.contains(&call) {
            return Err(anyhow!("connection timed out"));
        }
        let items = items_in(request.prompt);
        let keep = items.len().saturating_sub(self.truncate);
        Ok(items
            .iter()
            .take(keep)
            .enumerate()
            .map(|(i, d)| format!("{}. {}", i + 1, self.answers.get(d.as_str()).unwrap_or(&"Otros")))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

fn remote_only(service: &Scripted, chunk_size: usize) -> Classifier<'_> {
    let settings = BatchSettings {
        chunk_size,
        ..Default::default()
    };
    Classifier::new(Taxonomy::default(), KeywordMatcher::empty(), settings).with_service(service)
}

fn labels(categories: Vec<&Category>) -> Vec<String> {
    categories.iter().map(|c| c.to_string()).collect()
}

#[test]
fn test_duplicates_share_one_request_and_cache() {
    let csv = "Fecha,Descripción,Monto\n01/03/2024,Uber,-4500\n02/03/2024,Uber,-3900\n03/03/2024,Netflix,-8990\n";
    let table = parse_table(csv.as_bytes(), Format::Delimited).unwrap();
    let service = Scripted::new(&[("Uber", "Transporte"), ("Netflix", "Entretenimiento")]);
    let classifier = remote_only(&service, 50);
    let mut cache = ClassificationCache::new();

    let run = classifier.classify_table(&table, &mut cache).unwrap();
    assert_eq!(labels(run.categories()), vec!["Transporte", "Transporte", "Entretenimiento"]);
    assert_eq!(service.calls(), 1);
    assert_eq!(service.requested()[0], vec!["Uber", "Netflix"]);
    assert_eq!(cache.lookup_label("Uber"), Some("Transporte"));
    assert_eq!(cache.lookup_label("Netflix"), Some("Entretenimiento"));

    // a second file in the same run is answered from the cache
    let again = classifier.classify_table(&table, &mut cache).unwrap();
    assert_eq!(service.calls(), 1);
    assert!(again.transactions.iter().all(|t| t.classification.source == Source::Cache));
}

#[test]
fn test_short_reply_fills_tail_with_unclassified() {
    let csv = "Glosa,Fecha,Cargo\na,1,1\nb,2,2\nc,3,3\nd,4,4\ne,5,5\n";
    let table = parse_table(csv.as_bytes(), Format::Delimited).unwrap();
    let mut service = Scripted::new(&[("a", "Transporte"), ("b", "Comida"), ("c", "Salud")]);
    service.truncate = 2;
    let classifier = remote_only(&service, 50);
    let mut cache = ClassificationCache::new();

    let run = classifier.classify_table(&table, &mut cache).unwrap();
    assert_eq!(
        labels(run.categories()),
        vec!["Transporte", "Comida", "Salud", "No clasificado", "No clasificado"]
    );
    assert_eq!(run.report.batch.mismatches.len(), 1);
    assert_eq!(run.report.unclassified, 2);
    assert!(cache.lookup("d").is_none());
}

#[test]
fn test_failed_chunk_marks_only_its_rows_and_export_still_works() {
    let mut csv = String::from("Fecha;Detalle;Monto\n");
    for i in 0..6 {
        csv.push_str(&format!("0{}/01/2024;item {i};-{i}00\n", i + 1));
    }
    let table = parse_table(csv.as_bytes(), Format::Delimited).unwrap();
    let mut service = Scripted::new(&[("item 0", "Comida"), ("item 1", "Salud"), ("item 2", "Deuda")]);
    service.fail_on = vec![1];
    let classifier = remote_only(&service, 3);
    let mut cache = ClassificationCache::new();

    let run = classifier.classify_table(&table, &mut cache).unwrap();
    assert_eq!(service.calls(), 2);
    let cats = labels(run.categories());
    assert_eq!(&cats[..3], &["Comida", "Salud", "Deuda"]);
    for c in &cats[3..] {
        assert_eq!(c, "Error: connection timed out");
    }
    assert_eq!(run.report.failed, 3);
    assert_eq!(run.report.batch.failed_chunks, vec![1]);

    let out = run.export(ExportOptions::default()).unwrap();
    assert_eq!(out.headers, vec!["Date", "Amount", "Category"]);
    assert_eq!(out.rows.len(), 6);
    assert_eq!(out.rows[0], vec!["01/01/2024", "-000", "Comida"]);
    assert_eq!(out.rows[5][2], "Error: connection timed out");
}

#[test]
fn test_missing_description_column_makes_no_requests() {
    let csv = "Fecha,Monto\n01/01/2024,100\n";
    let table = parse_table(csv.as_bytes(), Format::Delimited).unwrap();
    let service = Scripted::new(&[]);
    let classifier = remote_only(&service, 50);
    let mut cache = ClassificationCache::new();

    let err = classifier.classify_table(&table, &mut cache).unwrap_err();
    assert!(matches!(err, GastosError::Schema { .. }));
    assert_eq!(service.calls(), 0);
}

#[test]
fn test_output_length_matches_input_for_every_chunk_size() {
    let mut csv = String::from("Date,Note,Amount\n");
    for i in 0..23 {
        let note = if i % 7 == 0 { String::new() } else { format!("gasto {}", i % 5) };
        csv.push_str(&format!("2024-01-{:02},{note},{i}\n", i + 1));
    }
    let table = parse_table(csv.as_bytes(), Format::Delimited).unwrap();
    assert_eq!(table.len(), 23);

    for chunk_size in [1, 2, 4, 50] {
        let service = Scripted::new(&[("gasto 1", "Compras")]);
        let classifier = remote_only(&service, chunk_size);
        let mut cache = ClassificationCache::new();
        let run = classifier.classify_table(&table, &mut cache).unwrap();
        assert_eq!(run.transactions.len(), 23);
        // five distinct texts, blanks never sent
        let sent: usize = service.requested().iter().map(Vec::len).sum();
        assert_eq!(sent, 5);
        for t in &run.transactions {
            if t.transaction.description.is_empty() {
                assert_eq!(t.classification.source, Source::Skipped);
                assert!(t.category().is_unclassified());
            }
        }
    }
}

#[test]
fn test_same_text_same_category_everywhere() {
    let csv = "Note,Date,Amount\nSpotify,1,1\nFarmacia,2,2\nSpotify,3,3\nSpotify,4,4\n";
    let table = parse_table(csv.as_bytes(), Format::Delimited).unwrap();
    let service = Scripted::new(&[("Spotify", "Entretenimiento"), ("Farmacia", "Salud")]);
    let classifier = remote_only(&service, 1);
    let mut cache = ClassificationCache::new();

    let run = classifier.classify_table(&table, &mut cache).unwrap();
    let cats = run.categories();
    assert_eq!(cats[0], cats[2]);
    assert_eq!(cats[2], cats[3]);
    assert_eq!(service.calls(), 2);
}

#[test]
fn test_keywords_short_circuit_remote_stage() {
    let csv = "Fecha,Glosa,Monto\n1,UBER *TRIP,1\n2,UBER EATS pedido,2\n3,Tienda de barrio xyz,3\n4,zzz,4\n";
    let table = parse_table(csv.as_bytes(), Format::Delimited).unwrap();
    let service = Scripted::new(&[("zzz", "Ingresos")]);
    let classifier = Classifier::default().with_service(&service);
    let mut cache = ClassificationCache::new();

    let run = classifier.classify_table(&table, &mut cache).unwrap();
    assert_eq!(labels(run.categories()), vec!["Transporte", "Comida", "Compras", "Ingresos"]);
    assert_eq!(service.requested(), vec![vec!["zzz".to_string()]]);
    assert_eq!(run.report.from_keywords, 3);
    assert_eq!(run.report.from_remote, 1);
}

#[test]
fn test_labels_outside_taxonomy_become_unclassified() {
    let csv = "Note,Date,Amount\nalgo,1,1\n";
    let table = parse_table(csv.as_bytes(), Format::Delimited).unwrap();
    let service = Scripted::new(&[("algo", "Mascotas")]);
    let classifier = remote_only(&service, 50);
    let mut cache = ClassificationCache::new();

    let run = classifier.classify_table(&table, &mut cache).unwrap();
    assert!(run.transactions[0].category().is_unclassified());
    assert!(cache.is_empty());
}

#[test]
fn test_repeated_keyword_hits_agree_before_any_request() {
    let taxonomy = Taxonomy::default();
    let rules = KeywordMatcher::new(
        vec![gastos_core::KeywordRule::new("Transporte", ["uber"])],
        &taxonomy,
    )
    .unwrap();
    let service = Scripted::new(&[("Netflix suscripción", "Entretenimiento")]);
    let classifier = Classifier::new(taxonomy, rules, BatchSettings::default()).with_service(&service);
    let mut cache = ClassificationCache::new();

    let (out, _) = classifier.classify_descriptions(
        &["Uber viaje", "Uber viaje", "Netflix suscripción"],
        None,
        &mut cache,
    );
    assert_eq!(out.len(), 3);
    assert_eq!(out[0].category, Category::label("Transporte"));
    assert_eq!(out[0].category, out[1].category);
    assert_eq!(out[2].category, Category::label("Entretenimiento"));
    assert_eq!(service.requested(), vec![vec!["Netflix suscripción".to_string()]]);
}
