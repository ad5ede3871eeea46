//! Algebraic laws every differ must satisfy, checked over sampled values.

use std::fmt::Debug;
use std::sync::{Arc, OnceLock};

use im::{HashMap, HashSet, Vector};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use patchwork_diff::{
    chunk, environment, hash_map, hash_set, or_else_either, or_else_result, transform, update,
    update_with, vec, zip, Context, Differ, Either, PatchConfig, Service, TagId,
};

fn check_laws<D>(d: &D, v1: &D::Value, v2: &D::Value, v3: &D::Value, v4: &D::Value) -> Result<(), TestCaseError>
where
    D: Differ,
    D::Value: PartialEq + Debug,
    D::Patch: PartialEq + Debug,
{
    let p12 = d.diff(v1, v2);
    let p23 = d.diff(v2, v3);
    let p34 = d.diff(v3, v4);

    // Associativity.
    let left = d.combine(&d.combine(&p12, &p23), &p34);
    let right = d.combine(&p12, &d.combine(&p23, &p34));
    prop_assert_eq!(d.patch(&left, v1), d.patch(&right, v1));
    prop_assert_eq!(&d.patch(&left, v1), v4);

    // Identity.
    prop_assert_eq!(&d.patch(&d.combine(&p12, &d.empty()), v1), v2);
    prop_assert_eq!(&d.patch(&d.combine(&d.empty(), &p12), v1), v2);

    // Diffing a value against itself.
    let same = d.diff(v1, v1);
    prop_assert!(d.is_empty(&same));
    prop_assert_eq!(same, d.empty());

    // Round trip.
    prop_assert_eq!(&d.patch(&p12, v1), v2);

    // Empty patch.
    prop_assert_eq!(&d.patch(&d.empty(), v1), v1);

    // Patches built from diffs never hit a missing target.
    let strict = d.apply(&left, v1, &PatchConfig::strict());
    prop_assert!(strict.is_ok());

    Ok(())
}

fn small_vector() -> impl Strategy<Value = Vector<i32>> {
    prop::collection::vec(0i32..5, 0..6).prop_map(Vector::from)
}

fn small_vec() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(0i32..5, 0..6)
}

fn nested_vector() -> impl Strategy<Value = Vector<Vector<i32>>> {
    prop::collection::vec(small_vector(), 0..4).prop_map(Vector::from)
}

fn small_map() -> impl Strategy<Value = HashMap<u8, u32>> {
    prop::collection::vec((0u8..6, 0u32..4), 0..6).prop_map(|pairs| pairs.into_iter().collect())
}

fn small_set() -> impl Strategy<Value = HashSet<u8>> {
    prop::collection::vec(0u8..8, 0..6).prop_map(|items| items.into_iter().collect())
}

fn either() -> impl Strategy<Value = Either<i32, String>> {
    prop_oneof![
        (0i32..4).prop_map(|n| Either::<i32, String>::Left(n)),
        "[a-c]{0,2}".prop_map(|s| Either::<i32, String>::Right(s)),
    ]
}

fn result() -> impl Strategy<Value = Result<u32, String>> {
    prop_oneof![
        (0u32..4).prop_map(|n| Ok::<u32, String>(n)),
        "[a-c]{0,2}".prop_map(|s| Err::<u32, String>(s)),
    ]
}

struct ServicePool {
    tags: Vec<TagId>,
    services: Vec<Service>,
}

fn pool() -> &'static ServicePool {
    static POOL: OnceLock<ServicePool> = OnceLock::new();
    POOL.get_or_init(|| ServicePool {
        tags: (0..4).map(|_| TagId::new("slot")).collect(),
        services: (0..3u32).map(|n| Arc::new(n) as Service).collect(),
    })
}

fn context() -> impl Strategy<Value = Context> {
    prop::collection::vec(prop::option::of(0usize..3), 4).prop_map(|slots| {
        let pool = pool();
        slots
            .iter()
            .enumerate()
            .filter_map(|(slot, service)| {
                service.map(|s| (pool.tags[slot], Arc::clone(&pool.services[s])))
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn update_laws((v1, v2, v3, v4) in (0i32..4, 0i32..4, 0i32..4, 0i32..4)) {
        check_laws(&update::<i32>(), &v1, &v2, &v3, &v4)?;
    }

    #[test]
    fn overwriting_update_with_laws((v1, v2, v3, v4) in (0i32..4, 0i32..4, 0i32..4, 0i32..4)) {
        let d = update_with(|_old: &i32, new: &i32| *new);
        check_laws(&d, &v1, &v2, &v3, &v4)?;
    }

    #[test]
    fn chunk_laws((v1, v2, v3, v4) in (small_vector(), small_vector(), small_vector(), small_vector())) {
        check_laws(&chunk(update::<i32>()), &v1, &v2, &v3, &v4)?;
    }

    #[test]
    fn nested_chunk_laws((v1, v2, v3, v4) in (nested_vector(), nested_vector(), nested_vector(), nested_vector())) {
        check_laws(&chunk(chunk(update::<i32>())), &v1, &v2, &v3, &v4)?;
    }

    #[test]
    fn vec_laws((v1, v2, v3, v4) in (small_vec(), small_vec(), small_vec(), small_vec())) {
        check_laws(&vec(update::<i32>()), &v1, &v2, &v3, &v4)?;
    }

    #[test]
    fn hash_map_laws((v1, v2, v3, v4) in (small_map(), small_map(), small_map(), small_map())) {
        check_laws(&hash_map(update::<u32>()), &v1, &v2, &v3, &v4)?;
    }

    #[test]
    fn hash_set_laws((v1, v2, v3, v4) in (small_set(), small_set(), small_set(), small_set())) {
        check_laws(&hash_set::<u8>(), &v1, &v2, &v3, &v4)?;
    }

    #[test]
    fn or_else_either_laws((v1, v2, v3, v4) in (either(), either(), either(), either())) {
        check_laws(&or_else_either(update::<i32>(), update::<String>()), &v1, &v2, &v3, &v4)?;
    }

    #[test]
    fn or_else_result_laws((v1, v2, v3, v4) in (result(), result(), result(), result())) {
        check_laws(&or_else_result(update::<u32>(), update::<String>()), &v1, &v2, &v3, &v4)?;
    }

    #[test]
    fn zip_laws(
        (a1, a2, a3, a4) in (0i32..4, 0i32..4, 0i32..4, 0i32..4),
        (b1, b2, b3, b4) in (small_vector(), small_vector(), small_vector(), small_vector()),
    ) {
        let d = zip(update::<i32>(), chunk(update::<i32>()));
        check_laws(&d, &(a1, b1), &(a2, b2), &(a3, b3), &(a4, b4))?;
    }

    #[test]
    fn transform_laws((v1, v2, v3, v4) in (small_vec(), small_vec(), small_vec(), small_vec())) {
        let d = transform(
            chunk(update::<i32>()),
            |values: &Vec<i32>| values.iter().copied().collect::<Vector<i32>>(),
            |values: Vector<i32>| values.into_iter().collect::<Vec<i32>>(),
        );
        check_laws(&d, &v1, &v2, &v3, &v4)?;
    }

    #[test]
    fn environment_laws((v1, v2, v3, v4) in (context(), context(), context(), context())) {
        check_laws(&environment(), &v1, &v2, &v3, &v4)?;
    }
}
