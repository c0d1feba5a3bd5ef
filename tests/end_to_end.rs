//! Integration tests exercising the public API end to end: create, insert
//! past several splits, partial-match select with wildcards, projection,
//! and stats.

use malhf::{Pattern, Projection, Relation, Selection, Tuple};

fn scratch(name: &str) -> std::path::PathBuf {
    tempfile::tempdir().expect("tempdir").into_path().join(name)
}

/// A 32-entry choice vector cycling bit `j` through attribute `j % nattrs`.
fn flat_choice_vector(nattrs: u8) -> String {
    (0..32u32)
        .map(|j| format!("{}:{}", (j as u8) % nattrs, j / nattrs as u32))
        .collect::<Vec<_>>()
        .join(",")
}

#[test]
fn create_insert_select_round_trip() {
    let path = scratch("people");
    let cv = flat_choice_vector(3);
    let mut rel = Relation::create(&path, 3, 2, 0, &cv).unwrap();

    let rows = [
        ("alice", "30", "nyc"),
        ("bob", "25", "sf"),
        ("carol", "40", "nyc"),
        ("dave", "22", "la"),
    ];
    for (name, age, city) in rows {
        rel.insert(&Tuple::parse(&format!("{name},{age},{city}"), 3).unwrap()).unwrap();
    }
    assert_eq!(rel.ntups(), rows.len() as u32);

    let pattern = Pattern::parse("?,?,nyc", 3).unwrap();
    let mut results: Vec<String> =
        Selection::new(&mut rel, pattern).unwrap().map(|t| t.as_str().to_string()).collect();
    results.sort();
    assert_eq!(results, vec!["alice,30,nyc".to_string(), "carol,40,nyc".to_string()]);

    rel.close().unwrap();
}

#[test]
fn reopened_relation_preserves_state_across_splits() {
    let path = scratch("reopen-across-splits");
    let cv = flat_choice_vector(1);
    let mut rel = Relation::create(&path, 1, 1, 0, &cv).unwrap();

    let n = 500;
    for i in 0..n {
        rel.insert(&Tuple::parse(&format!("value-{i}"), 1).unwrap()).unwrap();
    }
    let npages_before = rel.npages();
    let depth_before = rel.depth();
    rel.close().unwrap();
    assert!(npages_before > 1, "500 single-attribute rows should force at least one split");

    let mut reopened = Relation::open(&path, false).unwrap();
    assert_eq!(reopened.ntups(), n);
    assert_eq!(reopened.npages(), npages_before);
    assert_eq!(reopened.depth(), depth_before);

    let pattern = Pattern::parse("value-499", 1).unwrap();
    let results: Vec<String> =
        Selection::new(&mut reopened, pattern).unwrap().map(|t| t.as_str().to_string()).collect();
    assert_eq!(results, vec!["value-499".to_string()]);
}

#[test]
fn projection_reorders_and_subsets_attributes() {
    let path = scratch("projection");
    let cv = flat_choice_vector(3);
    let mut rel = Relation::create(&path, 3, 1, 0, &cv).unwrap();
    rel.insert(&Tuple::parse("alice,30,nyc", 3).unwrap()).unwrap();

    let pattern = Pattern::parse("?,?,?", 3).unwrap();
    let tuple = Selection::new(&mut rel, pattern).unwrap().next().unwrap();

    let projection = Projection::parse("3,1").unwrap();
    assert_eq!(projection.project(&tuple).unwrap(), "nyc,alice");

    let all = Projection::parse("*").unwrap();
    assert_eq!(all.project(&tuple).unwrap(), "alice,30,nyc");
}

#[test]
fn stats_reports_every_bucket_and_every_tuple() {
    let path = scratch("stats");
    let cv = flat_choice_vector(1);
    let mut rel = Relation::create(&path, 1, 1, 0, &cv).unwrap();
    for i in 0..50 {
        rel.insert(&Tuple::parse(&format!("row-{i}"), 1).unwrap()).unwrap();
    }

    let stats = rel.stats().unwrap();
    assert_eq!(stats.npages as usize, stats.buckets.len());
    assert_eq!(stats.ntups, 50);

    let total_tuples: u32 = stats
        .buckets
        .iter()
        .flat_map(|b| b.chain.iter())
        .map(|p| p.ntuples as u32)
        .sum();
    assert_eq!(total_tuples, 50);
}

#[test]
fn read_only_open_rejects_mutation_but_allows_select() {
    let path = scratch("read-only");
    let cv = flat_choice_vector(2);
    Relation::create(&path, 2, 1, 0, &cv)
        .unwrap()
        .close()
        .unwrap();

    let mut rel = Relation::open(&path, true).unwrap();
    rel.insert(&Tuple::parse("x,y", 2).unwrap()).unwrap();
    rel.close().unwrap();

    let mut readonly = Relation::open(&path, false).unwrap();
    assert!(readonly.insert(&Tuple::parse("a,b", 2).unwrap()).is_err());

    let pattern = Pattern::parse("?,?", 2).unwrap();
    let results: Vec<String> =
        Selection::new(&mut readonly, pattern).unwrap().map(|t| t.as_str().to_string()).collect();
    assert_eq!(results, vec!["x,y".to_string()]);
}
