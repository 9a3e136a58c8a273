use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use jumuiya_auth::permissions::names;
use jumuiya_auth::{
    AuthUser, PermissionTable, ResourceKind, ResourceOwner, Role, TableDefinition, can_manage_resource,
    get_role_permissions, has_permission,
};
use jumuiya_core::UserId;

fn bench_has_permission(c: &mut Criterion) {
    let mut group = c.benchmark_group("has_permission");

    for role in ["user", "guide", "auditor", "admin"] {
        let user = AuthUser::new(UserId::new(), role);

        group.bench_with_input(BenchmarkId::new("inherited_hit", role), &user, |b, user| {
            b.iter(|| has_permission(black_box(Some(user)), black_box(names::VIEW_DESTINATIONS)))
        });

        group.bench_with_input(BenchmarkId::new("miss", role), &user, |b, user| {
            b.iter(|| has_permission(black_box(Some(user)), black_box("launch_rockets")))
        });
    }

    group.finish();
}

fn bench_role_permissions(c: &mut Criterion) {
    let admin = Role::from("admin");
    c.bench_function("get_role_permissions/admin", |b| {
        b.iter(|| get_role_permissions(black_box(&admin)))
    });
}

fn bench_can_manage_resource(c: &mut Criterion) {
    let owner = AuthUser::new(UserId::new(), "user");
    let resource = ResourceOwner::new(owner.id);

    c.bench_function("can_manage_resource/owner_destination", |b| {
        b.iter(|| {
            can_manage_resource(
                black_box(Some(&owner)),
                black_box(Some(&resource)),
                black_box(Some(ResourceKind::Destination)),
            )
        })
    });
}

fn bench_table_build(c: &mut Criterion) {
    const DEFINITION: TableDefinition = jumuiya_auth::tables::BUILTIN;
    c.bench_function("permission_table/build", |b| {
        b.iter(|| PermissionTable::build(black_box(&DEFINITION)))
    });
}

criterion_group!(
    benches,
    bench_has_permission,
    bench_role_permissions,
    bench_can_manage_resource,
    bench_table_build
);
criterion_main!(benches);
