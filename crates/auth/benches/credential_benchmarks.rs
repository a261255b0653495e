use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chrono::{Duration, Utc};
use tablebook_auth::{PasswordHasher, Role, TokenService, User};
use tablebook_core::UserId;

fn sample_user() -> User {
    User {
        id: UserId::new(42),
        name: "Alice".to_string(),
        login: "alice".to_string(),
        password_hash: String::new(),
        role: Role::USER,
    }
}

/// Hashing is deliberately slow; this tracks the cost of the production work factor
/// against a cheap one so regressions in the defaults are visible.
fn bench_password_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("password_hash");
    group.sample_size(10);

    let production = PasswordHasher::new();
    let cheap = match PasswordHasher::with_cost(256, 1, 1) {
        Ok(h) => h,
        Err(e) => panic!("cheap params rejected: {e}"),
    };

    for (label, hasher) in [("production", &production), ("cheap", &cheap)] {
        group.bench_with_input(BenchmarkId::new("hash", label), hasher, |b, hasher| {
            b.iter(|| hasher.hash(black_box("correct horse battery")))
        });

        let digest = match hasher.hash("correct horse battery") {
            Ok(d) => d,
            Err(e) => panic!("hash failed: {e}"),
        };
        group.bench_with_input(BenchmarkId::new("verify", label), &digest, |b, digest| {
            b.iter(|| hasher.verify(black_box(digest), black_box("correct horse battery")))
        });
    }

    group.finish();
}

fn bench_tokens(c: &mut Criterion) {
    let tokens = match TokenService::new("bench-secret", Duration::hours(1)) {
        Ok(t) => t,
        Err(e) => panic!("token service: {e}"),
    };
    let user = sample_user();
    let now = Utc::now();

    c.bench_function("token_issue", |b| {
        b.iter(|| tokens.issue_at(black_box(&user), now))
    });

    let token = match tokens.issue_at(&user, now) {
        Ok(t) => t,
        Err(e) => panic!("issue failed: {e}"),
    };
    c.bench_function("token_verify", |b| {
        b.iter(|| tokens.verify_at(black_box(&token), now))
    });
}

criterion_group!(benches, bench_password_hashing, bench_tokens);
criterion_main!(benches);
