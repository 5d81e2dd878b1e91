//! End-to-end scenarios against the in-memory backend, exercising the
//! literal test cases named in the write/query protocol: unique
//! constraints + numeric range, full-text AND/OR, prefix/suffix/glob
//! matching, optimistic concurrency, index cleanup on delete, and geo
//! proximity. Each test below is grounded in one of those scenarios
//! rather than invented from scratch.

use rom::backend::InMemoryBackend;
use rom::core::error::RomError;
use rom::core::value::{FieldKind, FieldMap, FieldValue};
use rom::engine::Keygen;
use rom::{delete, get, get_by, save, FieldSpec, GeoFieldSpec, Model, ModelSchema, Query};

// -- Scenario 1: unique email + numeric range ------------------------------

struct User {
    id: Option<u64>,
    email: String,
    created: f64,
    snapshot: Option<FieldMap>,
}

static USER_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "email",
        kind: FieldKind::Text,
        keygen: None,
        unique: true,
        prefix: false,
        suffix: false,
    },
    FieldSpec {
        name: "created",
        kind: FieldKind::Float,
        keygen: Some(Keygen::Numeric),
        unique: false,
        prefix: false,
        suffix: false,
    },
];

static USER_SCHEMA: ModelSchema = ModelSchema {
    namespace: "scn1_user",
    fields: USER_FIELDS,
    geo: &[],
};

impl Model for User {
    fn schema() -> &'static ModelSchema {
        &USER_SCHEMA
    }
    fn id(&self) -> Option<u64> {
        self.id
    }
    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
    fn to_fields(&self) -> FieldMap {
        let mut f = FieldMap::new();
        f.insert("email".into(), FieldValue::Text(self.email.clone()));
        f.insert("created".into(), FieldValue::Float(self.created));
        f
    }
    fn from_fields(id: u64, mut f: FieldMap) -> rom::core::error::RomResult<Self> {
        let email = match f.remove("email") {
            Some(FieldValue::Text(v)) => v,
            _ => String::new(),
        };
        let created = match f.remove("created") {
            Some(FieldValue::Float(v)) => v,
            _ => 0.0,
        };
        Ok(User { id: Some(id), email, created, snapshot: None })
    }

    fn loaded_snapshot(&self) -> Option<&FieldMap> {
        self.snapshot.as_ref()
    }
    fn set_loaded_snapshot(&mut self, f: FieldMap) {
        self.snapshot = Some(f);
    }
}

#[test]
fn unique_lookup_and_numeric_range() {
    let be = InMemoryBackend::default();

    let mut a = User { id: None, email: "a@b".into(), created: 100.0, snapshot: None };
    save(&be, &mut a).unwrap();
    assert_eq!(a.id, Some(1));

    let mut c = User { id: None, email: "c@d".into(), created: 200.0, snapshot: None };
    save(&be, &mut c).unwrap();
    assert_eq!(c.id, Some(2));

    let found: Vec<User> = get_by(&be, "email", &FieldValue::Text("a@b".into())).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, Some(1));

    let in_range: Vec<User> = Query::new(&be)
        .unwrap()
        .range("created", Some(150.0), Some(250.0), false, false)
        .all()
        .unwrap();
    assert_eq!(in_range.iter().map(|u| u.id.unwrap()).collect::<Vec<_>>(), vec![2]);

    let mut dup = User { id: None, email: "a@b".into(), created: 300.0, snapshot: None };
    let err = save(&be, &mut dup).unwrap_err();
    match err {
        RomError::UniqueViolation { field, value, .. } => {
            assert_eq!(field, "email");
            assert_eq!(value, "a@b");
        }
        other => panic!("expected UniqueViolation, got {other:?}"),
    }
}

// -- Scenario 2: full-text AND (via .filter chaining) / OR (.filter_any) --

struct Post {
    id: Option<u64>,
    name: String,
    snapshot: Option<FieldMap>,
}

static POST_FIELDS: &[FieldSpec] = &[FieldSpec {
    name: "name",
    kind: FieldKind::Text,
    keygen: Some(Keygen::FullText),
    unique: false,
    prefix: false,
    suffix: false,
}];

static POST_SCHEMA: ModelSchema = ModelSchema {
    namespace: "scn2_post",
    fields: POST_FIELDS,
    geo: &[],
};

impl Model for Post {
    fn schema() -> &'static ModelSchema {
        &POST_SCHEMA
    }
    fn id(&self) -> Option<u64> {
        self.id
    }
    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
    fn to_fields(&self) -> FieldMap {
        let mut f = FieldMap::new();
        f.insert("name".into(), FieldValue::Text(self.name.clone()));
        f
    }
    fn from_fields(id: u64, mut f: FieldMap) -> rom::core::error::RomResult<Self> {
        let name = match f.remove("name") {
            Some(FieldValue::Text(v)) => v,
            _ => String::new(),
        };
        Ok(Post { id: Some(id), name, snapshot: None })
    }

    fn loaded_snapshot(&self) -> Option<&FieldMap> {
        self.snapshot.as_ref()
    }
    fn set_loaded_snapshot(&mut self, f: FieldMap) {
        self.snapshot = Some(f);
    }
}

#[test]
fn full_text_and_across_chained_filters_and_or_via_filter_any() {
    let be = InMemoryBackend::default();

    let mut p1 = Post { id: None, name: "Hello World".into(), snapshot: None };
    save(&be, &mut p1).unwrap();
    let mut p2 = Post { id: None, name: "hello there".into(), snapshot: None };
    save(&be, &mut p2).unwrap();

    let and_hits: Vec<Post> = Query::new(&be)
        .unwrap()
        .filter("name", FieldValue::Text("hello".into()))
        .unwrap()
        .filter("name", FieldValue::Text("world".into()))
        .unwrap()
        .all()
        .unwrap();
    assert_eq!(and_hits.iter().map(|p| p.id.unwrap()).collect::<Vec<_>>(), vec![1]);

    let or_hits: Vec<Post> = Query::new(&be)
        .unwrap()
        .filter_any(
            "name",
            &[
                FieldValue::Text("there".into()),
                FieldValue::Text("world".into()),
            ],
        )
        .unwrap()
        .all()
        .unwrap();
    let mut ids: Vec<u64> = or_hits.iter().map(|p| p.id.unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2]);
}

// -- Scenario 3: prefix / suffix / glob matching --------------------------

struct Account {
    id: Option<u64>,
    email: String,
    snapshot: Option<FieldMap>,
}

static ACCOUNT_FIELDS: &[FieldSpec] = &[FieldSpec {
    name: "email",
    kind: FieldKind::Text,
    keygen: None,
    unique: false,
    prefix: true,
    suffix: true,
}];

static ACCOUNT_SCHEMA: ModelSchema = ModelSchema {
    namespace: "scn3_account",
    fields: ACCOUNT_FIELDS,
    geo: &[],
};

impl Model for Account {
    fn schema() -> &'static ModelSchema {
        &ACCOUNT_SCHEMA
    }
    fn id(&self) -> Option<u64> {
        self.id
    }
    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
    fn to_fields(&self) -> FieldMap {
        let mut f = FieldMap::new();
        f.insert("email".into(), FieldValue::Text(self.email.clone()));
        f
    }
    fn from_fields(id: u64, mut f: FieldMap) -> rom::core::error::RomResult<Self> {
        let email = match f.remove("email") {
            Some(FieldValue::Text(v)) => v,
            _ => String::new(),
        };
        Ok(Account { id: Some(id), email, snapshot: None })
    }

    fn loaded_snapshot(&self) -> Option<&FieldMap> {
        self.snapshot.as_ref()
    }
    fn set_loaded_snapshot(&mut self, f: FieldMap) {
        self.snapshot = Some(f);
    }
}

#[test]
fn prefix_suffix_and_glob_matching() {
    let be = InMemoryBackend::default();

    let mut gmail = Account { id: None, email: "user@gmail.com".into(), snapshot: None };
    save(&be, &mut gmail).unwrap();
    let mut yahoo = Account { id: None, email: "other@yahoo.com".into(), snapshot: None };
    save(&be, &mut yahoo).unwrap();

    let starts: Vec<Account> = Query::new(&be).unwrap().startswith("email", "user@").all().unwrap();
    assert_eq!(starts.iter().map(|a| a.id.unwrap()).collect::<Vec<_>>(), vec![1]);

    let ends: Vec<Account> = Query::new(&be).unwrap().endswith("email", "@gmail.com").all().unwrap();
    assert_eq!(ends.iter().map(|a| a.id.unwrap()).collect::<Vec<_>>(), vec![1]);

    let globbed: Vec<Account> = Query::new(&be).unwrap().like("email", "*@gmail*").all().unwrap();
    assert_eq!(globbed.iter().map(|a| a.id.unwrap()).collect::<Vec<_>>(), vec![1]);
}

// -- Scenario 4: optimistic concurrency (data race) -----------------------

struct Counter {
    id: Option<u64>,
    x: i128,
    snapshot: Option<FieldMap>,
}

static COUNTER_FIELDS: &[FieldSpec] = &[FieldSpec {
    name: "x",
    kind: FieldKind::Integer,
    keygen: Some(Keygen::Numeric),
    unique: false,
    prefix: false,
    suffix: false,
}];

static COUNTER_SCHEMA: ModelSchema = ModelSchema {
    namespace: "scn4_counter",
    fields: COUNTER_FIELDS,
    geo: &[],
};

impl Model for Counter {
    fn schema() -> &'static ModelSchema {
        &COUNTER_SCHEMA
    }
    fn id(&self) -> Option<u64> {
        self.id
    }
    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
    fn to_fields(&self) -> FieldMap {
        let mut f = FieldMap::new();
        f.insert("x".into(), FieldValue::Integer(self.x));
        f
    }
    fn from_fields(id: u64, mut f: FieldMap) -> rom::core::error::RomResult<Self> {
        let x = match f.remove("x") {
            Some(FieldValue::Integer(v)) => v,
            _ => 0,
        };
        Ok(Counter { id: Some(id), x, snapshot: None })
    }

    fn loaded_snapshot(&self) -> Option<&FieldMap> {
        self.snapshot.as_ref()
    }
    fn set_loaded_snapshot(&mut self, f: FieldMap) {
        self.snapshot = Some(f);
    }
}

#[test]
fn two_writers_one_wins_one_data_races() {
    let be = InMemoryBackend::default();

    let mut seed = Counter { id: None, x: 1, snapshot: None };
    save(&be, &mut seed).unwrap();
    let id = seed.id.unwrap();

    // Both clients load the same record.
    let mut client_a: Counter = get(&be, id).unwrap().unwrap();
    let mut client_b: Counter = get(&be, id).unwrap().unwrap();

    client_a.x = 5;
    save(&be, &mut client_a).unwrap();

    client_b.x = 9;
    let err = save(&be, &mut client_b).unwrap_err();
    match err {
        RomError::DataRace { fields, .. } => assert!(fields.iter().any(|f| f == "x")),
        other => panic!("expected DataRace, got {other:?}"),
    }

    // B refreshes and retries successfully.
    let mut refreshed: Counter = get(&be, id).unwrap().unwrap();
    assert_eq!(refreshed.x, 5);
    refreshed.x = 9;
    save(&be, &mut refreshed).unwrap();

    let final_state: Counter = get(&be, id).unwrap().unwrap();
    assert_eq!(final_state.x, 9);
}

// -- Scenario 5: delete cleans up every index entry -----------------------

struct Tagged {
    id: Option<u64>,
    tag: String,
    score: f64,
    snapshot: Option<FieldMap>,
}

static TAGGED_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "tag",
        kind: FieldKind::Text,
        keygen: Some(Keygen::Identity),
        unique: false,
        prefix: false,
        suffix: false,
    },
    FieldSpec {
        name: "score",
        kind: FieldKind::Float,
        keygen: Some(Keygen::Numeric),
        unique: false,
        prefix: false,
        suffix: false,
    },
];

static TAGGED_SCHEMA: ModelSchema = ModelSchema {
    namespace: "scn5_tagged",
    fields: TAGGED_FIELDS,
    geo: &[],
};

impl Model for Tagged {
    fn schema() -> &'static ModelSchema {
        &TAGGED_SCHEMA
    }
    fn id(&self) -> Option<u64> {
        self.id
    }
    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
    fn to_fields(&self) -> FieldMap {
        let mut f = FieldMap::new();
        f.insert("tag".into(), FieldValue::Text(self.tag.clone()));
        f.insert("score".into(), FieldValue::Float(self.score));
        f
    }
    fn from_fields(id: u64, mut f: FieldMap) -> rom::core::error::RomResult<Self> {
        let tag = match f.remove("tag") {
            Some(FieldValue::Text(v)) => v,
            _ => String::new(),
        };
        let score = match f.remove("score") {
            Some(FieldValue::Float(v)) => v,
            _ => 0.0,
        };
        Ok(Tagged { id: Some(id), tag, score, snapshot: None })
    }

    fn loaded_snapshot(&self) -> Option<&FieldMap> {
        self.snapshot.as_ref()
    }
    fn set_loaded_snapshot(&mut self, f: FieldMap) {
        self.snapshot = Some(f);
    }
}

#[test]
fn delete_removes_every_index_entry_and_the_hash() {
    let be = InMemoryBackend::default();

    let mut rec = Tagged { id: None, tag: "red".into(), score: 3.0, snapshot: None };
    save(&be, &mut rec).unwrap();
    let id = rec.id.unwrap();

    let before: Vec<Tagged> = Query::new(&be).unwrap().filter("tag", FieldValue::Text("red".into())).unwrap().all().unwrap();
    assert_eq!(before.len(), 1);
    let before_range: Vec<Tagged> = Query::new(&be).unwrap().range("score", None, None, false, false).all().unwrap();
    assert_eq!(before_range.len(), 1);

    delete(&be, &rec).unwrap();

    assert!(get::<InMemoryBackend, Tagged>(&be, id).unwrap().is_none());
    let after: Vec<Tagged> = Query::new(&be).unwrap().filter("tag", FieldValue::Text("red".into())).unwrap().all().unwrap();
    assert!(after.is_empty());
    let after_range: Vec<Tagged> = Query::new(&be).unwrap().range("score", None, None, false, false).all().unwrap();
    assert!(after_range.is_empty());
}

// -- Scenario 6: geo proximity, combined with a term filter ---------------

struct Place {
    id: Option<u64>,
    tag: String,
    lon: f64,
    lat: f64,
    snapshot: Option<FieldMap>,
}

static PLACE_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "tag",
        kind: FieldKind::Text,
        keygen: Some(Keygen::Identity),
        unique: false,
        prefix: false,
        suffix: false,
    },
    FieldSpec::plain("lon", FieldKind::Float),
    FieldSpec::plain("lat", FieldKind::Float),
];

static PLACE_SCHEMA: ModelSchema = ModelSchema {
    namespace: "scn6_place",
    fields: PLACE_FIELDS,
    geo: &[GeoFieldSpec { name: "geo", lon_field: "lon", lat_field: "lat" }],
};

impl Model for Place {
    fn schema() -> &'static ModelSchema {
        &PLACE_SCHEMA
    }
    fn id(&self) -> Option<u64> {
        self.id
    }
    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
    fn to_fields(&self) -> FieldMap {
        let mut f = FieldMap::new();
        f.insert("tag".into(), FieldValue::Text(self.tag.clone()));
        f.insert("lon".into(), FieldValue::Float(self.lon));
        f.insert("lat".into(), FieldValue::Float(self.lat));
        f
    }
    fn from_fields(id: u64, mut f: FieldMap) -> rom::core::error::RomResult<Self> {
        let tag = match f.remove("tag") {
            Some(FieldValue::Text(v)) => v,
            _ => String::new(),
        };
        let lon = match f.remove("lon") {
            Some(FieldValue::Float(v)) => v,
            _ => 0.0,
        };
        let lat = match f.remove("lat") {
            Some(FieldValue::Float(v)) => v,
            _ => 0.0,
        };
        Ok(Place { id: Some(id), tag, lon, lat, snapshot: None })
    }

    fn loaded_snapshot(&self) -> Option<&FieldMap> {
        self.snapshot.as_ref()
    }
    fn set_loaded_snapshot(&mut self, f: FieldMap) {
        self.snapshot = Some(f);
    }
}

#[test]
fn near_finds_points_within_radius_and_combines_with_a_term_filter() {
    let be = InMemoryBackend::default();

    let mut near_point = Place { id: None, tag: "park".into(), lon: 0.0, lat: 50.0, snapshot: None };
    save(&be, &mut near_point).unwrap();
    let mut far_point = Place { id: None, tag: "park".into(), lon: 0.0, lat: 51.0, snapshot: None };
    save(&be, &mut far_point).unwrap();
    let mut wrong_tag = Place { id: None, tag: "shop".into(), lon: 0.0, lat: 50.0, snapshot: None };
    save(&be, &mut wrong_tag).unwrap();

    // One degree of latitude is ~111.2km, so a 120km radius spans both
    // points and a 50km radius spans only the exact match.
    let wide: Vec<Place> = Query::new(&be)
        .unwrap()
        .near("geo", 0.0, 50.0, 120.0, rom::backend::GeoUnit::Kilometers, None)
        .all()
        .unwrap();
    let mut wide_ids: Vec<u64> = wide.iter().map(|p| p.id.unwrap()).collect();
    wide_ids.sort_unstable();
    assert_eq!(wide_ids, vec![1, 2, 3]);

    let narrow: Vec<Place> = Query::new(&be)
        .unwrap()
        .near("geo", 0.0, 50.0, 50.0, rom::backend::GeoUnit::Kilometers, None)
        .all()
        .unwrap();
    let mut narrow_ids: Vec<u64> = narrow.iter().map(|p| p.id.unwrap()).collect();
    narrow_ids.sort_unstable();
    assert_eq!(narrow_ids, vec![1, 3]);

    let combined: Vec<Place> = Query::new(&be)
        .unwrap()
        .filter("tag", FieldValue::Text("park".into()))
        .unwrap()
        .near("geo", 0.0, 50.0, 50.0, rom::backend::GeoUnit::Kilometers, None)
        .all()
        .unwrap();
    assert_eq!(combined.iter().map(|p| p.id.unwrap()).collect::<Vec<_>>(), vec![1]);
}
