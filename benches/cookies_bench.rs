use cookiestash::cookies::canonical_cookie::CanonicalCookie;
use cookiestash::cookies::jar::PersistentJar;
use cookiestash::cookies::monster::CookieMonster;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use url::Url;

fn benchmark_cookie_insert(c: &mut Criterion) {
    let store = CookieMonster::new();
    let url = Url::parse("https://example.com").unwrap();

    c.bench_function("cookie_parse_and_save", |b| {
        b.iter(|| {
            let _ = store.parse_and_save_cookie(black_box(&url), black_box("foo=bar; Path=/; Secure"));
        })
    });
}

fn benchmark_cookie_get(c: &mut Criterion) {
    let store = CookieMonster::new();
    let url = Url::parse("https://example.com/foo/bar").unwrap();
    // Pre-populate
    for i in 0..40 {
        let _ = store.parse_and_save_cookie(&url, &format!("cookie{}=val; Path=/foo", i));
    }

    c.bench_function("cookie_get_for_url", |b| {
        b.iter(|| {
            black_box(store.get_cookies_for_url(black_box(&url)));
        })
    });
}

/// 200 origins across 20 sites, 5 cookies each.
fn populated_jar() -> PersistentJar {
    let mut jar = PersistentJar::new();
    for site in 0..20 {
        for host in 0..10 {
            let url = Url::parse(&format!("https://h{host}.site{site}.com/")).unwrap();
            let cookies = (0..5)
                .map(|n| CanonicalCookie::session(format!("c{n}"), "value"))
                .collect();
            jar.set_cookies(&url, cookies).unwrap();
        }
    }
    jar
}

fn benchmark_jar_set_cookies(c: &mut Criterion) {
    let mut jar = populated_jar();
    let url = Url::parse("https://h3.site7.com/").unwrap();

    c.bench_function("jar_set_cookies", |b| {
        b.iter(|| {
            jar.set_cookies(
                black_box(&url),
                vec![CanonicalCookie::session("fresh", "1")],
            )
            .unwrap();
        })
    });
}

fn benchmark_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");
    let jar = populated_jar();
    let encoded = jar.to_vec().unwrap();

    group.bench_function("encode_200_origins", |b| {
        b.iter(|| black_box(jar.to_vec().unwrap()))
    });

    group.bench_function("decode_200_origins", |b| {
        b.iter(|| {
            let mut restored = PersistentJar::new();
            restored.decode_slice(black_box(&encoded)).unwrap();
            black_box(restored)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_cookie_insert,
    benchmark_cookie_get,
    benchmark_jar_set_cookies,
    benchmark_snapshot
);
criterion_main!(benches);
