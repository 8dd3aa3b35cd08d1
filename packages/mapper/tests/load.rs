//! Loading entities into records: nesting, embedding, keys, capabilities
//! and the partial-success contract.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use propmap_core::{Entity, Error, FieldMismatch, GeoPoint, Key, Property, Value};
use propmap_mapper::{
    load, load_properties, Constraint, Dynamic, KeyLoader, PropertyLoader, PropertySaver, Record,
    Schema,
};

fn test_key0() -> Key {
    Key::name("kind", "name0", None)
}

fn test_key1a() -> Key {
    Key::name("kind", "name1", None)
}

fn test_key1b() -> Key {
    Key::name("kind", "name1", Some(test_key0()))
}

fn test_key2a() -> Key {
    Key::name("kind", "name2", Some(test_key1a()))
}

fn entity_value(entity: Entity) -> Value {
    Value::Entity(Box::new(entity))
}

#[derive(Debug, Default, PartialEq)]
struct Simple {
    i: i64,
}

impl Record for Simple {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new().field("I", |r| &r.i, |r| &mut r.i)
    }
}

#[derive(Debug, Default, PartialEq)]
struct SimpleWithTag {
    i: i64,
}

impl Record for SimpleWithTag {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new().tagged("I", "II", |r| &r.i, |r| &mut r.i)
    }
}

#[derive(Debug, Default, PartialEq)]
struct NestedSimpleWithTag {
    a: SimpleWithTag,
}

impl Record for NestedSimpleWithTag {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new().tagged("A", "AA", |r| &r.a, |r| &mut r.a)
    }
}

#[derive(Debug, Default, PartialEq)]
struct NestedSliceOfSimple {
    a: Vec<Simple>,
}

impl Record for NestedSliceOfSimple {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new().field("A", |r| &r.a, |r| &mut r.a)
    }
}

#[derive(Debug, Default, PartialEq)]
struct SimpleTwoFields {
    s: String,
    ss: String,
}

impl Record for SimpleTwoFields {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .field("S", |r| &r.s, |r| &mut r.s)
            .field("SS", |r| &r.ss, |r| &mut r.ss)
    }
}

#[derive(Debug, Default, PartialEq)]
struct NestedSimpleAnonymous {
    simple: Simple,
    x: String,
}

impl Record for NestedSimpleAnonymous {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .embed("Simple", |r| &r.simple, |r| &mut r.simple)
            .field("X", |r| &r.x, |r| &mut r.x)
    }
}

#[derive(Debug, Default, PartialEq)]
struct NestedSimple {
    a: Simple,
    i: i32,
}

impl Record for NestedSimple {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .field("A", |r| &r.a, |r| &mut r.a)
            .field("I", |r| &r.i, |r| &mut r.i)
    }
}

#[derive(Debug, Default, PartialEq)]
struct NestedSimple1 {
    a: Simple,
    x: String,
}

impl Record for NestedSimple1 {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .field("A", |r| &r.a, |r| &mut r.a)
            .field("X", |r| &r.x, |r| &mut r.x)
    }
}

#[derive(Debug, Default, PartialEq)]
struct NestedSimple2X {
    aa: NestedSimple,
    a: SimpleTwoFields,
    s: String,
}

impl Record for NestedSimple2X {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .field("AA", |r| &r.aa, |r| &mut r.aa)
            .field("A", |r| &r.a, |r| &mut r.a)
            .field("S", |r| &r.s, |r| &mut r.s)
    }
}

#[derive(Debug, Default, PartialEq)]
struct BDotB {
    b: String,
}

impl Record for BDotB {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new().tagged("B", "B.B", |r| &r.b, |r| &mut r.b)
    }
}

#[derive(Debug, Default, PartialEq)]
struct ABDotB {
    a: BDotB,
}

impl Record for ABDotB {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new().field("A", |r| &r.a, |r| &mut r.a)
    }
}

#[derive(Debug, Default, PartialEq)]
struct MultiAnonymous {
    simple: Simple,
    two: SimpleTwoFields,
    x: String,
}

impl Record for MultiAnonymous {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .embed("Simple", |r| &r.simple, |r| &mut r.simple)
            .embed("SimpleTwoFields", |r| &r.two, |r| &mut r.two)
            .field("X", |r| &r.x, |r| &mut r.x)
    }
}

#[test]
fn flattened_names_reach_nested_fields() {
    let mut got = NestedSimple1::default();
    let entity = Entity::new()
        .with_key(test_key0())
        .with_property("X", "two")
        .with_property("A.I", 2i64);
    load(&mut got, entity).unwrap();
    assert_eq!(
        got,
        NestedSimple1 {
            a: Simple { i: 2 },
            x: "two".into()
        }
    );

    let mut got = NestedSimpleWithTag::default();
    load(&mut got, Entity::new().with_property("AA.II", 2i64)).unwrap();
    assert_eq!(got.a.i, 2);

    let mut got = ABDotB::default();
    load(&mut got, Entity::new().with_property("A.B.B", "bb")).unwrap();
    assert_eq!(got.a.b, "bb");
}

#[test]
fn embedded_fields_are_promoted() {
    let mut got = NestedSimpleAnonymous::default();
    let entity = Entity::new()
        .with_property("X", "two")
        .with_property("I", 2i64);
    load(&mut got, entity).unwrap();
    assert_eq!(
        got,
        NestedSimpleAnonymous {
            simple: Simple { i: 2 },
            x: "two".into()
        }
    );

    let mut got = MultiAnonymous::default();
    let entity = Entity::new()
        .with_property("I", 3i64)
        .with_property("S", "S")
        .with_property("SS", "s")
        .with_property("X", "s");
    load(&mut got, entity).unwrap();
    assert_eq!(
        got,
        MultiAnonymous {
            simple: Simple { i: 3 },
            two: SimpleTwoFields {
                s: "S".into(),
                ss: "s".into()
            },
            x: "s".into(),
        }
    );
}

#[test]
fn nested_entity_values() {
    let mut got = NestedSimple::default();
    let entity = Entity::new()
        .with_property("A", entity_value(Entity::new().with_property("I", 3i64)))
        .with_property("I", 10i64);
    load(&mut got, entity).unwrap();
    assert_eq!(
        got,
        NestedSimple {
            a: Simple { i: 3 },
            i: 10
        }
    );

    let mut got = NestedSimpleWithTag::default();
    let entity =
        Entity::new().with_property("AA", entity_value(Entity::new().with_property("II", 1i64)));
    load(&mut got, entity).unwrap();
    assert_eq!(got.a.i, 1);

    let mut got = ABDotB::default();
    let entity =
        Entity::new().with_property("A", entity_value(Entity::new().with_property("B.B", "bb")));
    load(&mut got, entity).unwrap();
    assert_eq!(got.a.b, "bb");
}

#[test]
fn nested_twice() {
    let mut got = NestedSimple2X::default();
    let aa = Entity::new()
        .with_property("A", entity_value(Entity::new().with_property("I", 3i64)))
        .with_property("I", 1i64);
    let a = Entity::new()
        .with_property("S", "S")
        .with_property("SS", "s");
    let entity = Entity::new()
        .with_property("AA", entity_value(aa))
        .with_property("A", entity_value(a))
        .with_property("S", "SS");
    load(&mut got, entity).unwrap();
    assert_eq!(
        got,
        NestedSimple2X {
            aa: NestedSimple {
                a: Simple { i: 3 },
                i: 1
            },
            a: SimpleTwoFields {
                s: "S".into(),
                ss: "s".into()
            },
            s: "SS".into(),
        }
    );
}

#[test]
fn arrays_of_nested_entities() {
    let mut got = NestedSliceOfSimple::default();
    let entity = Entity::new().with_property(
        "A",
        Value::Array(vec![
            entity_value(Entity::new().with_property("I", 3i64)),
            entity_value(Entity::new().with_property("I", 4i64)),
        ]),
    );
    load(&mut got, entity).unwrap();
    assert_eq!(got.a, vec![Simple { i: 3 }, Simple { i: 4 }]);
}

#[derive(Debug, Default, PartialEq)]
struct WithKey {
    x: String,
    i: i32,
    k: Option<Key>,
}

impl Record for WithKey {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .field("X", |r| &r.x, |r| &mut r.x)
            .field("I", |r| &r.i, |r| &mut r.i)
            .tagged("K", "__key__", |r| &r.k, |r| &mut r.k)
    }
}

#[derive(Debug, Default, PartialEq)]
struct NestedWithKey {
    y: String,
    n: WithKey,
}

impl Record for NestedWithKey {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .field("Y", |r| &r.y, |r| &mut r.y)
            .field("N", |r| &r.n, |r| &mut r.n)
    }
}

fn nested_with_key(inner_key: Key) -> Entity {
    Entity::new()
        .with_key(test_key0())
        .with_property("Y", "yyy")
        .with_property(
            "N",
            entity_value(
                Entity::new()
                    .with_key(inner_key)
                    .with_property("X", "two")
                    .with_property("I", 2i64),
            ),
        )
}

#[test]
fn nested_entity_keys_are_assigned() {
    let mut got = NestedWithKey::default();
    load(&mut got, nested_with_key(test_key1a())).unwrap();
    assert_eq!(
        got,
        NestedWithKey {
            y: "yyy".into(),
            n: WithKey {
                x: "two".into(),
                i: 2,
                k: Some(test_key1a()),
            },
        }
    );
}

#[test]
fn invalid_nested_keys_are_still_assigned() {
    let incomplete = Key::incomplete("", None);
    let invalid = Key::name("s", "", Some(incomplete));
    assert!(!invalid.is_valid());

    let mut got = NestedWithKey::default();
    load(&mut got, nested_with_key(invalid.clone())).unwrap();
    assert_eq!(got.n.k, Some(invalid));
}

struct Stringer;

impl Constraint for Stringer {
    const NAME: &'static str = "Stringer";

    fn admits(value: &Value) -> bool {
        matches!(value, Value::Entity(_))
    }
}

#[derive(Debug, Default)]
struct WithTypedInterface {
    field: Dynamic<Stringer>,
}

impl Record for WithTypedInterface {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new().field("Field", |r| &r.field, |r| &mut r.field)
    }
}

#[derive(Debug, Default)]
struct WithUntypedInterface {
    field: Dynamic,
}

impl Record for WithUntypedInterface {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new().field("Field", |r| &r.field, |r| &mut r.field)
    }
}

#[test]
fn typed_dynamic_field_rejects_unassignable_values() {
    let mut got = WithTypedInterface::default();
    let entity = Entity::new()
        .with_key(test_key0())
        .with_property("Field", "Foo");
    let err = load(&mut got, entity).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot load field \"Field\" into a \"WithTypedInterface\": \"string\" is not assignable to \"Stringer\""
    );
}

#[test]
fn untyped_dynamic_field_is_overwritten() {
    let mut got = WithUntypedInterface::default();
    load(&mut got, Entity::new().with_property("Field", "Foo")).unwrap();
    assert_eq!(got.field.value(), &Value::from("Foo"));

    let mut got = WithUntypedInterface {
        field: Dynamic::new(Value::Float(1e9)).unwrap(),
    };
    load(&mut got, Entity::new().with_property("Field", "Newly set")).unwrap();
    assert_eq!(got.field.value(), &Value::from("Newly set"));
}

#[derive(Debug, Default)]
struct Civil {
    date: NaiveDate,
    date_time: NaiveDateTime,
    time: NaiveTime,
    instant: chrono::DateTime<Utc>,
}

impl Record for Civil {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .field("Date", |r| &r.date, |r| &mut r.date)
            .field("DateTime", |r| &r.date_time, |r| &mut r.date_time)
            .field("Time", |r| &r.time, |r| &mut r.time)
            .field("Instant", |r| &r.instant, |r| &mut r.instant)
    }
}

#[test]
fn civil_types_load_in_utc() {
    let date = Utc.timestamp_opt(1605474000, 0).unwrap();
    let morning = Utc.timestamp_opt(1605504600, 0).unwrap();

    let mut got = Civil::default();
    let entity = Entity::new()
        .with_property("Date", date)
        .with_property("DateTime", morning)
        .with_property("Time", morning)
        .with_property("Instant", morning);
    load(&mut got, entity).unwrap();

    assert_eq!(got.date, NaiveDate::from_ymd_opt(2020, 11, 15).unwrap());
    assert_eq!(
        got.date_time,
        NaiveDate::from_ymd_opt(2020, 11, 16)
            .unwrap()
            .and_hms_opt(5, 30, 0)
            .unwrap()
    );
    assert_eq!((got.time.hour(), got.time.minute()), (5, 30));
    assert_eq!(got.instant, morning);
    assert_eq!(got.instant.timezone(), Utc);
}

#[derive(Debug, Default, PartialEq)]
struct NestedSimple2 {
    a: Option<Simple>,
    i: i32,
    u: Dynamic,
}

impl Record for NestedSimple2 {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .field("A", |r| &r.a, |r| &mut r.a)
            .field("I", |r| &r.i, |r| &mut r.i)
            .field("U", |r| &r.u, |r| &mut r.u)
    }
}

#[derive(Debug, Default, PartialEq)]
struct NestedStructPtrs {
    two: Option<SimpleTwoFields>,
    nest: Option<SimpleTwoFields>,
    twice_nest: Option<NestedSimple2>,
    i: i32,
}

impl Record for NestedStructPtrs {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .embed("SimpleTwoFields", |r| &r.two, |r| &mut r.two)
            .field("Nest", |r| &r.nest, |r| &mut r.nest)
            .field("TwiceNest", |r| &r.twice_nest, |r| &mut r.twice_nest)
            .field("I", |r| &r.i, |r| &mut r.i)
    }
}

#[test]
fn already_populated_destinations() {
    let mut got = Simple { i: 12 };
    load(&mut got, Entity::new().with(Property::null("I"))).unwrap();
    assert_eq!(got, Simple::default());

    let mut got = SimpleTwoFields {
        s: "hello".into(),
        ss: String::new(),
    };
    load(&mut got, Entity::new().with_property("SS", "world")).unwrap();
    assert_eq!(got.s, "hello");
    assert_eq!(got.ss, "world");

    let mut got = NestedStructPtrs {
        two: Some(SimpleTwoFields {
            s: "hello".into(),
            ss: String::new(),
        }),
        nest: Some(SimpleTwoFields {
            s: String::new(),
            ss: "twice hello".into(),
        }),
        twice_nest: Some(NestedSimple2 {
            a: Some(Simple { i: 2 }),
            i: 0,
            u: Dynamic::new(Value::Float(1e9)).unwrap(),
        }),
        i: 0,
    };
    let twice = Entity::new()
        .with(Property::null("A"))
        .with_property("I", 2i64)
        .with_property("U", "replaced");
    let entity = Entity::new()
        .with_key(test_key0())
        .with(Property::null("S"))
        .with_property("SS", "ss hello")
        .with(Property::null("Nest"))
        .with_property("TwiceNest", entity_value(twice))
        .with_property("I", 5i64);
    load(&mut got, entity).unwrap();

    assert_eq!(
        got,
        NestedStructPtrs {
            two: Some(SimpleTwoFields {
                s: String::new(),
                ss: "ss hello".into()
            }),
            nest: None,
            twice_nest: Some(NestedSimple2 {
                a: None,
                i: 2,
                u: Dynamic::new(Value::from("replaced")).unwrap(),
            }),
            i: 5,
        }
    );
}

#[derive(Debug, Default, PartialEq)]
struct Pls0 {
    a: String,
}

impl PropertyLoader for Pls0 {
    fn load(&mut self, properties: Vec<Property>) -> Result<(), Error> {
        for p in properties {
            if p.name == "A" {
                if let Value::String(s) = p.value {
                    self.a = s;
                }
            }
        }
        Ok(())
    }
}

impl PropertySaver for Pls0 {
    fn save(&self) -> Result<Vec<Property>, Error> {
        Ok(vec![Property::new("A", self.a.as_str())])
    }
}

impl Record for Pls0 {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new().with_loader().with_saver()
    }
}

#[derive(Debug, Default, PartialEq)]
struct KeyLoader1 {
    a: String,
    k: Option<Key>,
}

impl PropertyLoader for KeyLoader1 {
    fn load(&mut self, properties: Vec<Property>) -> Result<(), Error> {
        for p in properties {
            if let ("A", Value::String(s)) = (p.name.as_str(), p.value) {
                self.a = s;
            }
        }
        Ok(())
    }
}

impl KeyLoader for KeyLoader1 {
    fn load_key(&mut self, key: Key) -> Result<(), Error> {
        self.k = Some(key);
        Ok(())
    }
}

impl Record for KeyLoader1 {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new().with_loader().with_key_loader()
    }
}

#[derive(Debug, Default, PartialEq)]
struct KeyLoader2 {
    b: i64,
    key: Option<Key>,
}

impl PropertyLoader for KeyLoader2 {
    fn load(&mut self, properties: Vec<Property>) -> Result<(), Error> {
        for p in properties {
            if let ("B", Value::Integer(b)) = (p.name.as_str(), p.value) {
                self.b = b;
            }
        }
        Ok(())
    }
}

impl KeyLoader for KeyLoader2 {
    fn load_key(&mut self, key: Key) -> Result<(), Error> {
        self.key = Some(key);
        Ok(())
    }
}

impl Record for KeyLoader2 {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new().with_loader().with_key_loader()
    }
}

#[derive(Debug, Default, PartialEq)]
struct KeyLoader3 {
    c: bool,
    k: Option<Key>,
}

impl PropertyLoader for KeyLoader3 {
    fn load(&mut self, properties: Vec<Property>) -> Result<(), Error> {
        for p in properties {
            if let ("C", Value::Bool(c)) = (p.name.as_str(), p.value) {
                self.c = c;
            }
        }
        Ok(())
    }
}

impl KeyLoader for KeyLoader3 {
    fn load_key(&mut self, key: Key) -> Result<(), Error> {
        self.k = Some(key);
        Ok(())
    }
}

impl Record for KeyLoader3 {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new().with_loader().with_key_loader()
    }
}

/// Embeds a loader and forwards to it, receiving the key itself.
#[derive(Debug, Default, PartialEq)]
struct KeyLoader4 {
    pls0: Pls0,
    k: Option<Key>,
}

impl PropertyLoader for KeyLoader4 {
    fn load(&mut self, properties: Vec<Property>) -> Result<(), Error> {
        PropertyLoader::load(&mut self.pls0, properties)
    }
}

impl KeyLoader for KeyLoader4 {
    fn load_key(&mut self, key: Key) -> Result<(), Error> {
        self.k = Some(key);
        Ok(())
    }
}

impl Record for KeyLoader4 {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .embed("Pls0", |r| &r.pls0, |r| &mut r.pls0)
            .with_loader()
            .with_key_loader()
    }
}

#[derive(Debug, Default, PartialEq)]
struct NotKeyLoader {
    a: String,
    k: Option<Key>,
}

impl PropertyLoader for NotKeyLoader {
    fn load(&mut self, properties: Vec<Property>) -> Result<(), Error> {
        for p in properties {
            if let ("A", Value::String(s)) = (p.name.as_str(), p.value) {
                self.a = s;
            }
        }
        Ok(())
    }
}

impl Record for NotKeyLoader {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new().with_loader()
    }
}

#[derive(Debug, Default, PartialEq)]
struct NotPlsKeyLoader {
    a: String,
    k: Option<Key>,
}

impl Record for NotPlsKeyLoader {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .field("A", |r| &r.a, |r| &mut r.a)
            .tagged("K", "__key__", |r| &r.k, |r| &mut r.k)
    }
}

#[derive(Debug, Default, PartialEq)]
struct NestedKeyLoaders {
    two: Option<KeyLoader2>,
    three: Vec<KeyLoader3>,
    four: Option<KeyLoader4>,
    pls: Option<NotKeyLoader>,
}

impl Record for NestedKeyLoaders {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .field("Two", |r| &r.two, |r| &mut r.two)
            .field("Three", |r| &r.three, |r| &mut r.three)
            .field("Four", |r| &r.four, |r| &mut r.four)
            .field("PLS", |r| &r.pls, |r| &mut r.pls)
    }
}

#[test]
fn simple_key_loader() {
    let mut got = KeyLoader1::default();
    let entity = Entity::new()
        .with_key(test_key0())
        .with_property("A", "hello");
    load(&mut got, entity).unwrap();
    assert_eq!(
        got,
        KeyLoader1 {
            a: "hello".into(),
            k: Some(test_key0())
        }
    );
}

#[test]
fn key_field_is_assigned_despite_unmatched_properties() {
    let mut got = NotPlsKeyLoader::default();
    let entity = Entity::new()
        .with_key(test_key0())
        .with_property("A", "hello")
        .with_property("B", "unmatched");
    let err = load(&mut got, entity).unwrap_err();
    assert_eq!(
        err.field_mismatches(),
        &[FieldMismatch::new("NotPlsKeyLoader", "B", "no such struct field")]
    );
    assert_eq!(
        got,
        NotPlsKeyLoader {
            a: "hello".into(),
            k: Some(test_key0())
        }
    );
}

#[test]
fn forwarding_loader_with_key() {
    let mut got = KeyLoader4::default();
    let entity = Entity::new()
        .with_key(test_key0())
        .with_property("A", "hello");
    load(&mut got, entity).unwrap();
    assert_eq!(
        got,
        KeyLoader4 {
            pls0: Pls0 { a: "hello".into() },
            k: Some(test_key0())
        }
    );
}

#[test]
fn nested_key_loaders() {
    let entity = Entity::new()
        .with_key(test_key0())
        .with_property(
            "Two",
            entity_value(
                Entity::new()
                    .with_key(test_key1a())
                    .with_property("B", 12i64),
            ),
        )
        .with_property(
            "Three",
            Value::Array(vec![
                entity_value(
                    Entity::new()
                        .with_key(test_key1b())
                        .with_property("C", true),
                ),
                entity_value(
                    Entity::new()
                        .with_key(test_key0())
                        .with_property("C", false),
                ),
            ]),
        )
        .with_property(
            "Four",
            entity_value(
                Entity::new()
                    .with_key(test_key2a())
                    .with_property("A", "testing"),
            ),
        )
        .with_property(
            "PLS",
            entity_value(
                Entity::new()
                    .with_key(test_key1a())
                    .with_property("A", "something"),
            ),
        );

    let mut got = NestedKeyLoaders::default();
    load(&mut got, entity).unwrap();
    assert_eq!(
        got,
        NestedKeyLoaders {
            two: Some(KeyLoader2 {
                b: 12,
                key: Some(test_key1a())
            }),
            three: vec![
                KeyLoader3 {
                    c: true,
                    k: Some(test_key1b())
                },
                KeyLoader3 {
                    c: false,
                    k: Some(test_key0())
                },
            ],
            four: Some(KeyLoader4 {
                pls0: Pls0 {
                    a: "testing".into()
                },
                k: Some(test_key2a()),
            }),
            pls: Some(NotKeyLoader {
                a: "something".into(),
                k: None
            }),
        }
    );
}

#[derive(Debug, Default, PartialEq)]
struct KeyLoader6 {
    a: String,
    b: String,
    k: Option<Key>,
}

impl PropertyLoader for KeyLoader6 {
    fn load(&mut self, properties: Vec<Property>) -> Result<(), Error> {
        for p in properties {
            if let ("A", Value::String(s)) = (p.name.as_str(), p.value) {
                self.a = s;
            }
        }
        Err(Error::mismatch("KeyLoader6", "B", "no value found"))
    }
}

impl KeyLoader for KeyLoader6 {
    fn load_key(&mut self, key: Key) -> Result<(), Error> {
        self.k = Some(key);
        Ok(())
    }
}

impl Record for KeyLoader6 {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new().with_loader().with_key_loader()
    }
}

#[derive(Debug, Default, PartialEq)]
struct KeyLoader7 {
    a: String,
    k: Option<Key>,
}

impl PropertyLoader for KeyLoader7 {
    fn load(&mut self, properties: Vec<Property>) -> Result<(), Error> {
        for p in properties {
            if let ("A", Value::String(s)) = (p.name.as_str(), p.value) {
                self.a = s;
            }
        }
        Ok(())
    }
}

impl KeyLoader for KeyLoader7 {
    fn load_key(&mut self, _key: Key) -> Result<(), Error> {
        Err(Error::mismatch("KeyLoader7", "key", "no value found"))
    }
}

impl Record for KeyLoader7 {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new().with_loader().with_key_loader()
    }
}

#[derive(Debug)]
struct CustomLoadError;

impl std::fmt::Display for CustomLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("custom load error")
    }
}

impl std::error::Error for CustomLoadError {}

#[derive(Debug, Default, PartialEq)]
struct KeyLoader8 {
    a: String,
    k: Option<Key>,
}

impl PropertyLoader for KeyLoader8 {
    fn load(&mut self, properties: Vec<Property>) -> Result<(), Error> {
        for p in properties {
            if let ("A", Value::String(s)) = (p.name.as_str(), p.value) {
                self.a = s;
            }
        }
        Err(Error::custom(CustomLoadError))
    }
}

impl KeyLoader for KeyLoader8 {
    fn load_key(&mut self, _key: Key) -> Result<(), Error> {
        Err(Error::mismatch("KeyLoader8", "key", "no value found"))
    }
}

impl Record for KeyLoader8 {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new().with_loader().with_key_loader()
    }
}

fn hello() -> Entity {
    Entity::new()
        .with_key(test_key0())
        .with_property("A", "hello")
}

#[test]
fn loader_mismatch_still_assigns_key() {
    let mut got = KeyLoader6::default();
    let err = load(&mut got, hello()).unwrap_err();
    assert!(err.is_field_mismatch());
    assert_eq!(err.field_mismatches()[0].field, "B");
    assert_eq!(
        got,
        KeyLoader6 {
            a: "hello".into(),
            b: String::new(),
            k: Some(test_key0())
        }
    );
}

#[test]
fn key_loader_mismatch_is_reported() {
    let mut got = KeyLoader7::default();
    let err = load(&mut got, hello()).unwrap_err();
    assert_eq!(
        err.field_mismatches(),
        &[FieldMismatch::new("KeyLoader7", "key", "no value found")]
    );
    assert_eq!(
        got,
        KeyLoader7 {
            a: "hello".into(),
            k: None
        }
    );
}

#[test]
fn loader_failure_wins_over_key_mismatch() {
    let mut got = KeyLoader8::default();
    let err = load(&mut got, hello()).unwrap_err();
    assert!(!err.is_field_mismatch());
    assert_eq!(err.to_string(), "custom load error");
    assert_eq!(
        got,
        KeyLoader8 {
            a: "hello".into(),
            k: None
        }
    );
}

#[derive(Debug, Default, PartialEq)]
struct Pointers {
    pi: Option<i64>,
    ps: Option<String>,
    pb: Option<bool>,
    pf: Option<f64>,
    pg: Option<GeoPoint>,
    pt: Option<chrono::DateTime<Utc>>,
}

impl Record for Pointers {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .field("Pi", |r| &r.pi, |r| &mut r.pi)
            .field("Ps", |r| &r.ps, |r| &mut r.ps)
            .field("Pb", |r| &r.pb, |r| &mut r.pb)
            .field("Pf", |r| &r.pf, |r| &mut r.pf)
            .field("Pg", |r| &r.pg, |r| &mut r.pg)
            .field("Pt", |r| &r.pt, |r| &mut r.pt)
    }
}

#[test]
fn optional_fields() {
    let names = ["Pi", "Ps", "Pb", "Pf", "Pg", "Pt"];

    let mut got = Pointers::default();
    load_properties(&mut got, names.iter().map(|n| Property::null(*n)).collect()).unwrap();
    assert_eq!(got, Pointers::default());

    let mut got = Pointers::default();
    load_properties(&mut got, Vec::new()).unwrap();
    assert_eq!(got, Pointers::default());

    let t = Utc.timestamp_opt(100, 0).unwrap();
    let mut got = Pointers::default();
    load_properties(
        &mut got,
        vec![
            Property::new("Pi", 1i64),
            Property::new("Ps", "x"),
            Property::new("Pb", true),
            Property::new("Pf", 2.75),
            Property::new("Pg", GeoPoint::new(1.0, 2.0)),
            Property::new("Pt", t),
        ],
    )
    .unwrap();
    assert_eq!(
        got,
        Pointers {
            pi: Some(1),
            ps: Some("x".into()),
            pb: Some(true),
            pf: Some(2.75),
            pg: Some(GeoPoint::new(1.0, 2.0)),
            pt: Some(t),
        }
    );
}

#[derive(Debug, Default, PartialEq)]
struct Strings {
    s: Vec<String>,
}

impl Record for Strings {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new().field("S", |r| &r.s, |r| &mut r.s)
    }
}

#[test]
fn single_value_into_sequence() {
    let mut got = Strings::default();
    load_properties(&mut got, vec![Property::new("S", "x")]).unwrap();
    assert_eq!(got.s, vec!["x".to_string()]);
}

#[test]
fn empty_array_into_sequence_is_a_no_op() {
    let mut got = Strings {
        s: vec!["x".into()],
    };
    load_properties(&mut got, vec![Property::new("S", Value::Array(vec![]))]).unwrap();
    assert_eq!(got.s, vec!["x".to_string()]);
}

#[derive(Debug, Default, PartialEq)]
struct Basics {
    i: i64,
    f: f64,
    s: String,
    b: bool,
    a: Vec<String>,
}

impl Record for Basics {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .field("I", |r| &r.i, |r| &mut r.i)
            .field("F", |r| &r.f, |r| &mut r.f)
            .field("S", |r| &r.s, |r| &mut r.s)
            .field("B", |r| &r.b, |r| &mut r.b)
            .field("A", |r| &r.a, |r| &mut r.a)
    }
}

#[derive(Debug, Default, PartialEq)]
struct OptionalBasics {
    x: Option<Basics>,
}

impl Record for OptionalBasics {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new().field("X", |r| &r.x, |r| &mut r.x)
    }
}

#[derive(Debug, Default, PartialEq)]
struct PlainBasics {
    x: Basics,
}

impl Record for PlainBasics {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new().field("X", |r| &r.x, |r| &mut r.x)
    }
}

#[test]
fn null_values() {
    let mut got = Basics {
        i: 1,
        f: 1.0,
        s: "1".into(),
        b: true,
        a: vec!["X".into()],
    };
    let props = ["I", "F", "S", "B", "A"].iter().map(|n| Property::null(*n)).collect();
    load_properties(&mut got, props).unwrap();
    assert_eq!(
        got,
        Basics {
            a: vec![String::new()],
            ..Default::default()
        }
    );

    let mut got = OptionalBasics {
        x: Some(Basics::default()),
    };
    load_properties(&mut got, vec![Property::null("X")]).unwrap();
    assert_eq!(got.x, None);

    let mut got = PlainBasics::default();
    let err = load_properties(&mut got, vec![Property::null("X")]).unwrap_err();
    assert!(err.is_field_mismatch());
    assert_eq!(err.field_mismatches()[0].field, "X");
}

#[test]
fn mismatches_leave_the_rest_loaded() {
    let mut got = Basics::default();
    let err = load_properties(
        &mut got,
        vec![
            Property::new("I", "not a number"),
            Property::new("F", 2.5),
            Property::new("S", 7i64),
            Property::new("B", true),
        ],
    )
    .unwrap_err();
    assert_eq!(got.f, 2.5);
    assert!(got.b);
    assert_eq!(got.i, 0);
    assert_eq!(err.field_mismatches().len(), 2);
    assert!(err
        .to_string()
        .ends_with("(and 1 more field mismatches)"));
}
