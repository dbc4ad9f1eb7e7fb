use crate::testing::Harness;

#[test]
fn prob_extremes() {
    let mut h = Harness::new();
    for _ in 0..50 {
        assert!(h.succeeds("prob(1.1)"));
        assert!(!h.succeeds("prob(0)"));
    }
}

#[test]
fn prob_is_roughly_fair() {
    let mut h = Harness::new();
    let hits = (0..2000).filter(|_| h.succeeds("prob(0.5)")).count();
    assert!((800..1200).contains(&hits), "{} hits", hits);
}

#[test]
fn pick_returns_one_member() {
    let mut h = Harness::new();
    for _ in 0..20 {
        let v = h.values("pick([a, b, c], X)", "X");
        assert_eq!(v.len(), 1);
        assert!(["a", "b", "c"].contains(&v[0].as_str()));
    }
    assert_eq!(h.count("pick([], X)"), 0);
}

#[test]
fn rand_stays_in_range() {
    let mut h = Harness::new();
    for _ in 0..50 {
        let v: f64 = h.values("rand(2, 4, X)", "X")[0].parse().unwrap();
        assert!((2.0..4.0).contains(&v));
    }
}

#[test]
fn randint_is_integral_and_half_open() {
    let mut h = Harness::new();
    for _ in 0..50 {
        let v: f64 = h.values("randint(1, 4, X)", "X")[0].parse().unwrap();
        assert_eq!(v, v.floor());
        assert!((1.0..4.0).contains(&v));
    }
    assert_eq!(h.values("randint(5, 5, X)", "X"), vec!["5"]);
}

#[test]
fn randint_spans_the_whole_integer_range() {
    let mut h = Harness::new();
    for _ in 0..20 {
        let v: f64 = h.values("randint(0 - 10000000000000000000, 10000000000000000000, X)", "X")[0]
            .parse()
            .unwrap();
        assert!(v.is_finite());
        assert!((i64::MIN as f64..=i64::MAX as f64).contains(&v));
    }
}

#[test]
fn seeded_generators_repeat() {
    let mut a = Harness::new();
    let mut b = Harness::new();
    let xs: Vec<String> = (0..10).flat_map(|_| a.values("rand(0, 1, X)", "X")).collect();
    let ys: Vec<String> = (0..10).flat_map(|_| b.values("rand(0, 1, X)", "X")).collect();
    assert_eq!(xs, ys);
}
