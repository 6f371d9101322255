use alloc::borrow::Cow;
use alloc::collections::BTreeMap;
use core::any::{Any, TypeId};
use core::sync::atomic::{AtomicUsize, Ordering};
use std::collections::HashMap as StdHashMap;
use std::io;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::info::{AnnotationValue, AnnotationWriter};
use crate::resolve::{ContainerHandler, EntryTarget, HandlerFactory, HandlerResolver};
use crate::select::{EnumerableSelector, FixedListSelector};
use crate::sink::{FlushSink, JsonSink, OutputSink};
use crate::state::{CollectionFrame, Frame};
use crate::value::{Binary, Value, ValueKind, WriteValue};
use crate::write::WriteContext;
use crate::{CancellationFlag, MetaError, MetadataFactory, Resource, ResourceWriter};
use crate::{WriteError, WriteState, WriterOptions};

// -----------------------------------------------------------------------------
// Fixtures

#[derive(Resource)]
struct Customer {
    #[resource(rename = "Id")]
    id: i64,
    #[resource(rename = "Name")]
    name: String,
    #[resource(rename = "Email", skip_if = Customer::no_email)]
    email: Option<String>,
    #[resource(rename = "Note", skip_if_default)]
    note: String,
    #[resource(skip)]
    cache: u64,
}

impl Customer {
    fn no_email(_: &Customer, email: &Option<String>) -> bool {
        email.is_none()
    }

    fn plain() -> Self {
        Self {
            id: 1,
            name: "Ann".into(),
            email: None,
            note: String::new(),
            cache: 9,
        }
    }
}

#[derive(Resource)]
#[resource(name = "Page", etag = Page::etag)]
struct Page {
    #[resource(rename = "Items", count = Page::item_count, next_link_writer = Page::next_link)]
    items: Vec<i32>,
    #[resource(rename = "Total", count = Page::item_count, position = "post")]
    total: u32,
    #[resource(skip)]
    next: Option<String>,
}

impl Page {
    fn etag(_: &Page) -> Option<AnnotationValue> {
        Some(AnnotationValue::Text("abc".into()))
    }

    fn item_count(page: &Page) -> Option<AnnotationValue> {
        Some(AnnotationValue::Count(page.items.len() as u64))
    }

    fn next_link(page: &Page, writer: AnnotationWriter<'_>) -> Result<(), WriteError> {
        match &page.next {
            Some(link) => writer.write_text(link),
            None => Ok(()),
        }
    }
}

#[derive(Resource)]
#[resource(count = Inner::count, etag = Inner::etag)]
struct Inner {
    #[resource(rename = "V")]
    v: i32,
}

impl Inner {
    fn count(_: &Inner) -> Option<AnnotationValue> {
        Some(AnnotationValue::Count(7))
    }

    fn etag(_: &Inner) -> Option<AnnotationValue> {
        Some(AnnotationValue::Text("e".into()))
    }
}

#[derive(Resource)]
struct Outer {
    #[resource(rename = "Child", count = Outer::child_count)]
    child: Inner,
    #[resource(rename = "Other")]
    other: Inner,
}

impl Outer {
    fn child_count(_: &Outer) -> Option<AnnotationValue> {
        Some(AnnotationValue::Count(5))
    }
}

#[derive(Resource)]
struct Product {
    #[resource(rename = "Sku")]
    sku: String,
    #[resource(annotations)]
    notes: Vec<(String, Value)>,
    #[resource(dynamic)]
    extra: BTreeMap<String, Value>,
}

#[derive(Resource)]
struct Line {
    #[resource(rename = "Text")]
    text: String,
    #[resource(rename = "Data")]
    data: Binary,
}

#[derive(Resource)]
struct Doc {
    #[resource(rename = "Title")]
    title: String,
    #[resource(rename = "Lines")]
    lines: Vec<Line>,
    #[resource(rename = "Matrix")]
    matrix: Vec<Vec<u8>>,
}

fn long_text() -> String {
    "héllo \"wörld\"\n€ ".repeat(12)
}

fn doc() -> Doc {
    Doc {
        title: long_text(),
        lines: vec![
            Line {
                text: long_text(),
                data: Binary((0..=255).collect()),
            },
            Line {
                text: "short".into(),
                data: Binary(Vec::new()),
            },
        ],
        matrix: vec![vec![1, 2], Vec::new(), vec![3]],
    }
}

fn product() -> Product {
    Product {
        sku: "A1".into(),
        notes: vec![("ns.note".into(), Value::from("x"))],
        extra: BTreeMap::from([
            ("bio".to_string(), Value::Text(long_text())),
            ("color".to_string(), Value::from("red")),
            (
                "size".to_string(),
                Value::Object(vec![
                    ("w".into(), Value::Int(2)),
                    ("tags".into(), Value::List(vec![Value::Bool(true), Value::Null])),
                ]),
            ),
        ]),
    }
}

/// Drives `step` to completion, flushing at every suspension.
///
/// Returns the output and the number of suspensions.
fn run<F>(capacity: usize, mut step: F) -> (String, usize)
where
    F: FnMut(&mut WriteState, &mut dyn OutputSink) -> Result<bool, WriteError>,
{
    let mut state = WriteState::new();
    let mut sink = JsonSink::new(Vec::<u8>::new(), capacity);
    let mut suspensions = 0;
    while !step(&mut state, &mut sink).unwrap() {
        suspensions += 1;
        assert!(suspensions < 100_000, "no progress");
        sink.flush().unwrap();
    }
    assert!(state.is_idle());
    (String::from_utf8(sink.into_inner().unwrap()).unwrap(), suspensions)
}

fn write_once<T: Resource>(writer: &ResourceWriter<'_>, resource: &T) -> String {
    let (output, suspensions) = run(1 << 20, |state, sink| writer.write_resource(resource, state, sink));
    assert_eq!(suspensions, 0);
    output
}

// -----------------------------------------------------------------------------
// Output

#[test]
fn plain_resource() {
    let writer = ResourceWriter::new();
    let customer = Customer::plain();
    assert_eq!(write_once(&writer, &customer), r#"{"Id":1,"Name":"Ann"}"#);
    assert_eq!(customer.cache, 9);

    let customer = Customer {
        email: Some("a@b".into()),
        note: "vip".into(),
        ..Customer::plain()
    };
    assert_eq!(
        write_once(&writer, &customer),
        r#"{"Id":1,"Name":"Ann","Email":"a@b","Note":"vip"}"#
    );
}

#[test]
fn annotations_in_order() {
    let writer = ResourceWriter::new();
    let page = Page {
        items: vec![1, 2],
        total: 3,
        next: Some("p2".into()),
    };
    assert_eq!(
        write_once(&writer, &page),
        concat!(
            r#"{"@odata.etag":"abc","#,
            r#""Items@odata.count":2,"Items@odata.nextLink":"p2","Items":[1,2],"#,
            r#""Total":3,"Total@odata.count":2}"#
        )
    );

    let page = Page { next: None, ..page };
    assert_eq!(
        write_once(&writer, &page),
        r#"{"@odata.etag":"abc","Items@odata.count":2,"Items":[1,2],"Total":3,"Total@odata.count":2}"#
    );
}

#[test]
fn property_annotations_override_type_annotations() {
    let writer = ResourceWriter::new();
    let outer = Outer {
        child: Inner { v: 1 },
        other: Inner { v: 2 },
    };
    assert_eq!(
        write_once(&writer, &outer),
        concat!(
            r#"{"Child@odata.count":5,"Child":{"@odata.etag":"e","V":1},"#,
            r#""Other":{"@odata.count":7,"@odata.etag":"e","V":2}}"#
        )
    );
}

#[test]
fn containers_and_dynamic_values() {
    let writer = ResourceWriter::new();
    let expected = format!(
        concat!(
            r#"{{"@ns.note":"x","Sku":"A1","bio":{},"color":"red","#,
            r#""size":{{"w":2,"tags":[true,null]}}}}"#
        ),
        serde_json::to_string(&long_text()).unwrap()
    );
    assert_eq!(write_once(&writer, &product()), expected);
}

#[test]
fn nested_collections_text_and_binary() {
    let writer = ResourceWriter::new();
    let text = serde_json::to_string(&long_text()).unwrap();
    let bytes: Vec<u8> = (0..=255).collect();
    let expected = format!(
        concat!(
            r#"{{"Title":{t},"Lines":[{{"Text":{t},"Data":"{b}"}},{{"Text":"short","Data":""}}],"#,
            r#""Matrix":[[1,2],[],[3]]}}"#
        ),
        t = text,
        b = STANDARD.encode(&bytes)
    );
    assert_eq!(write_once(&writer, &doc()), expected);
}

// -----------------------------------------------------------------------------
// Suspension

#[test]
fn output_does_not_depend_on_capacity() {
    let writer = ResourceWriter::new();
    let doc = doc();
    let product = product();
    let outer = Outer {
        child: Inner { v: 1 },
        other: Inner { v: 2 },
    };

    let whole_doc = write_once(&writer, &doc);
    let whole_product = write_once(&writer, &product);
    let whole_outer = write_once(&writer, &outer);

    for capacity in [0, 1, 2, 3, 5, 7, 16, 31, 64, 200] {
        let (output, suspensions) = run(capacity, |state, sink| writer.write_resource(&doc, state, sink));
        assert_eq!(output, whole_doc, "capacity {capacity}");
        assert!(suspensions > 0);

        let (output, _) = run(capacity, |state, sink| writer.write_resource(&product, state, sink));
        assert_eq!(output, whole_product, "capacity {capacity}");

        let (output, _) = run(capacity, |state, sink| writer.write_resource(&outer, state, sink));
        assert_eq!(output, whole_outer, "capacity {capacity}");
    }
}

#[test]
fn small_chunk_limit() {
    let options = WriterOptions {
        text_chunk_limit: 3,
        ..WriterOptions::default()
    };
    let writer = ResourceWriter::new().with_options(options);
    let doc = doc();

    let whole = write_once(&ResourceWriter::new(), &doc);
    let (output, _) = run(64, |state, sink| writer.write_resource(&doc, state, sink));
    assert_eq!(output, whole);
}

#[test]
fn suspension_keeps_frames() {
    let writer = ResourceWriter::new();
    let doc = doc();
    let mut state = WriteState::new();
    let mut sink = JsonSink::new(Vec::<u8>::new(), 8);

    assert!(!writer.write_resource(&doc, &mut state, &mut sink).unwrap());
    assert!(!state.is_idle());
    assert!(matches!(state.frames().first(), Some(Frame::Resource(frame)) if frame.type_name() == "Doc"));

    writer.write_to_end(&doc, &mut state, &mut sink).unwrap();
    assert!(state.is_idle());
}

#[test]
fn hooks_run_once() {
    static BEFORE: AtomicUsize = AtomicUsize::new(0);
    static AFTER: AtomicUsize = AtomicUsize::new(0);

    #[derive(Resource)]
    #[resource(before_serialize = Hooked::before, after_serialize = Hooked::after)]
    struct Hooked {
        text: String,
    }

    impl Hooked {
        fn before(_: &Hooked) {
            BEFORE.fetch_add(1, Ordering::Relaxed);
        }

        fn after(_: &Hooked) {
            AFTER.fetch_add(1, Ordering::Relaxed);
        }
    }

    let writer = ResourceWriter::new();
    let hooked = Hooked { text: long_text() };
    let (_, suspensions) = run(1, |state, sink| writer.write_resource(&hooked, state, sink));
    assert!(suspensions > 1);
    assert_eq!(BEFORE.load(Ordering::Relaxed), 1);
    assert_eq!(AFTER.load(Ordering::Relaxed), 1);
}

#[test]
fn resumes_after_the_first_property() {
    #[derive(Resource)]
    struct Order {
        #[resource(rename = "Id")]
        id: i64,
        #[resource(rename = "Name")]
        name: String,
    }

    let writer = ResourceWriter::new();
    let order = Order {
        id: 1,
        name: "x".into(),
    };
    let mut state = WriteState::new();
    let mut sink = JsonSink::new(Vec::<u8>::new(), 7);

    assert!(!writer.write_resource(&order, &mut state, &mut sink).unwrap());
    assert_eq!(sink.buffered(), br#"{"Id":1"#);
    sink.flush().unwrap();

    assert!(writer.write_resource(&order, &mut state, &mut sink).unwrap());
    assert_eq!(sink.buffered(), br#","Name":"x"}"#);
    assert!(state.is_idle());
}

#[test]
fn empty_sequences_complete_at_once() {
    #[derive(Resource)]
    struct Empty {
        #[resource(rename = "Items")]
        items: Vec<Value>,
    }

    let writer = ResourceWriter::new();
    let empty = Empty { items: Vec::new() };
    assert_eq!(write_once(&writer, &empty), r#"{"Items":[]}"#);

    let nothing = EnumerableSelector::new(|_: &Empty| Box::new(core::iter::empty::<Cow<'static, str>>()));
    let mut state = WriteState::new();
    let mut sink = JsonSink::new(Vec::<u8>::new(), 2);
    assert!(writer.write_resource_with(&empty, &nothing, &mut state, &mut sink).unwrap());
    assert_eq!(sink.buffered(), b"{}");
}

#[test]
fn open_properties_from_pairs() {
    #[derive(Resource)]
    struct Open {
        #[resource(dynamic)]
        extra: Vec<(String, i64)>,
    }

    let writer = ResourceWriter::new();
    let open = Open {
        extra: vec![("a".into(), 1), ("b".into(), 2)],
    };
    let (output, _) = run(1, |state, sink| writer.write_resource(&open, state, sink));
    assert_eq!(output, r#"{"a":1,"b":2}"#);
}

#[test]
fn long_text_in_two_segments() {
    #[derive(Resource)]
    struct Note {
        #[resource(rename = "S")]
        s: String,
    }

    let writer = ResourceWriter::new();
    let note = Note {
        s: "abcdefghij".repeat(4),
    };
    let (output, suspensions) = run(24, |state, sink| writer.write_resource(&note, state, sink));
    assert_eq!(suspensions, 1);
    assert_eq!(output, format!(r#"{{"S":"{}"}}"#, note.s));
}

#[test]
fn boxed_and_shared_text() {
    #[derive(Resource)]
    struct Alias {
        #[resource(rename = "Tag")]
        tag: Box<str>,
        #[resource(rename = "Shared")]
        shared: alloc::sync::Arc<str>,
    }

    assert_eq!(<Box<str> as WriteValue>::KIND, ValueKind::Text);
    let writer = ResourceWriter::new();
    let alias = Alias {
        tag: "a".into(),
        shared: "b".into(),
    };
    assert_eq!(write_once(&writer, &alias), r#"{"Tag":"a","Shared":"b"}"#);
}

#[test]
fn escaped_segments_stay_within_capacity() {
    #[derive(Resource)]
    struct Quote {
        #[resource(rename = "T")]
        text: String,
    }

    let writer = ResourceWriter::new();
    let quote = Quote {
        text: "\"".repeat(20),
    };
    let mut state = WriteState::new();
    let mut sink = JsonSink::new(Vec::<u8>::new(), 16);
    let mut calls = 0;
    loop {
        calls += 1;
        let done = writer.write_resource(&quote, &mut state, &mut sink).unwrap();
        assert!(sink.buffered().len() <= 16, "{:?}", String::from_utf8_lossy(sink.buffered()));
        if done {
            break;
        }
        sink.flush().unwrap();
    }
    assert_eq!(calls, 3);
    let expected = format!(r#"{{"T":{}}}"#, serde_json::to_string(&quote.text).unwrap());
    assert_eq!(sink.into_inner().unwrap(), expected.as_bytes());
}

#[test]
fn short_text_is_written_whole() {
    #[derive(Resource)]
    struct Pair {
        #[resource(rename = "Code")]
        code: String,
        #[resource(rename = "Label")]
        label: String,
    }

    let writer = ResourceWriter::new();
    let pair = Pair {
        code: "abcd".into(),
        label: "é\t".into(),
    };
    let mut state = WriteState::new();
    let mut sink = JsonSink::new(Vec::<u8>::new(), 6);

    assert!(!writer.write_resource(&pair, &mut state, &mut sink).unwrap());
    assert_eq!(sink.buffered(), br#"{"Code":"abcd""#);
    assert!(matches!(state.frames(), [Frame::Resource(_)]));
    sink.flush().unwrap();

    assert!(writer.write_resource(&pair, &mut state, &mut sink).unwrap());
    assert_eq!(sink.buffered(), r#","Label":"é\t"}"#.as_bytes());
}

// -----------------------------------------------------------------------------
// Selectors

#[test]
fn fixed_list_selector() {
    let writer = ResourceWriter::new();
    let info = Customer::type_info().unwrap();
    let customer = Customer::plain();

    let selector = FixedListSelector::of(info, &["Name", "Id"]).unwrap();
    let (output, _) = run(1, |state, sink| {
        writer.write_resource_with(&customer, &selector, state, sink)
    });
    assert_eq!(output, r#"{"Name":"Ann","Id":1}"#);

    assert!(matches!(
        FixedListSelector::of(info, &["Nope"]),
        Err(WriteError::UnknownProperty { name, .. }) if &*name == "Nope"
    ));
    assert!(matches!(
        FixedListSelector::of(info, &["Id", "Id"]),
        Err(WriteError::Meta(MetaError::DuplicateProperty { .. }))
    ));
}

#[test]
fn enumerable_selector_resumes() {
    let writer = ResourceWriter::new();
    let doc = doc();
    let selector = EnumerableSelector::new(|_: &Doc| {
        Box::new(["Matrix", "Title"].into_iter().map(Cow::Borrowed))
    });

    let (whole, _) = run(1 << 20, |state, sink| writer.write_resource_with(&doc, &selector, state, sink));
    assert!(whole.starts_with(r#"{"Matrix":[[1,2],[],[3]],"Title":""#));

    for capacity in [1, 4, 9] {
        let (output, _) = run(capacity, |state, sink| {
            writer.write_resource_with(&doc, &selector, state, sink)
        });
        assert_eq!(output, whole);
    }
}

#[test]
fn enumerable_selector_rejects_bad_names() {
    let writer = ResourceWriter::new();
    let customer = Customer::plain();

    let unknown = EnumerableSelector::new(|_: &Customer| Box::new(["Id", "Nope"].into_iter().map(Cow::Borrowed)));
    let mut state = WriteState::new();
    let mut sink = JsonSink::new(Vec::<u8>::new(), 1024);
    let err = writer
        .write_resource_with(&customer, &unknown, &mut state, &mut sink)
        .unwrap_err();
    assert!(matches!(err, WriteError::UnknownProperty { type_name: "Customer", .. }));
    assert!(!state.is_poisoned());

    let repeated = EnumerableSelector::new(|_: &Customer| Box::new(["Id", "Id"].into_iter().map(Cow::Borrowed)));
    let mut state = WriteState::new();
    let mut sink = JsonSink::new(Vec::<u8>::new(), 1024);
    let err = writer
        .write_resource_with(&customer, &repeated, &mut state, &mut sink)
        .unwrap_err();
    assert!(matches!(err, WriteError::Meta(MetaError::DuplicateProperty { .. })));
}

#[test]
fn rejected_names_are_raised_again() {
    let writer = ResourceWriter::new();
    let customer = Customer::plain();
    let selector = EnumerableSelector::new(|_: &Customer| {
        Box::new(["Id", "Bogus", "Name"].into_iter().map(Cow::Borrowed))
    });

    let mut state = WriteState::new();
    let mut sink = JsonSink::new(Vec::<u8>::new(), 1024);
    for _ in 0..2 {
        let err = writer
            .write_resource_with(&customer, &selector, &mut state, &mut sink)
            .unwrap_err();
        assert!(matches!(err, WriteError::UnknownProperty { name, .. } if &*name == "Bogus"));
        assert!(!state.is_poisoned());
    }
    assert_eq!(sink.buffered(), br#"{"Id":1"#);

    let repeated = EnumerableSelector::new(|_: &Customer| {
        Box::new(["Id", "Id", "Name"].into_iter().map(Cow::Borrowed))
    });
    let mut state = WriteState::new();
    let mut sink = JsonSink::new(Vec::<u8>::new(), 1024);
    for _ in 0..2 {
        let err = writer
            .write_resource_with(&customer, &repeated, &mut state, &mut sink)
            .unwrap_err();
        assert!(matches!(err, WriteError::Meta(MetaError::DuplicateProperty { .. })));
    }
    assert_eq!(sink.buffered(), br#"{"Id":1"#);
}

// -----------------------------------------------------------------------------
// Containers

#[test]
fn custom_container_handler() {
    struct Tags(Vec<String>);

    struct TagHandler;

    impl ContainerHandler for TagHandler {
        fn write_entries(
            &self,
            container: &dyn Any,
            target: EntryTarget,
            cx: &mut WriteContext<'_>,
        ) -> Result<bool, WriteError> {
            let tags = container
                .downcast_ref::<Tags>()
                .ok_or(WriteError::ContainerTypeMismatch { expected: "Tags" })?;
            cx.write_entries(tags.0.iter().map(|tag| (tag.as_str(), &true)), target)
        }
    }

    struct TagFactory;

    impl HandlerFactory for TagFactory {
        fn can_handle(&self, type_id: TypeId) -> bool {
            type_id == TypeId::of::<Tags>()
        }

        fn create(&self, _: TypeId) -> Option<alloc::sync::Arc<dyn ContainerHandler>> {
            Some(alloc::sync::Arc::new(TagHandler))
        }
    }

    #[derive(Resource)]
    struct Tagged {
        #[resource(rename = "Id")]
        id: u8,
        #[resource(dynamic)]
        tags: Tags,
        #[resource(annotations)]
        meta: StdHashMap<String, i64>,
    }

    let tagged = Tagged {
        id: 4,
        tags: Tags(vec!["new".into(), "hot".into()]),
        meta: StdHashMap::from([("ns.rank".to_string(), 2)]),
    };

    let default_writer = ResourceWriter::new();
    let mut state = WriteState::new();
    let mut sink = JsonSink::new(Vec::<u8>::new(), 1024);
    assert!(matches!(
        default_writer.write_resource(&tagged, &mut state, &mut sink),
        Err(WriteError::NoHandler("Tagged"))
    ));
    assert!(!state.is_poisoned());

    let mut resolver = HandlerResolver::with_defaults();
    resolver.register(TagFactory);
    let writer = ResourceWriter::new().with_resolver(resolver);
    let (output, _) = run(1, |state, sink| writer.write_resource(&tagged, state, sink));
    assert_eq!(output, r#"{"@ns.rank":2,"Id":4,"new":true,"hot":true}"#);
}

// -----------------------------------------------------------------------------
// Errors and state

#[test]
fn depth_limit() {
    let writer = ResourceWriter::new().with_options(WriterOptions {
        max_depth: 2,
        ..WriterOptions::default()
    });
    let mut state = WriteState::new();
    let mut sink = JsonSink::new(Vec::<u8>::new(), 1 << 20);

    let err = writer.write_resource(&doc(), &mut state, &mut sink).unwrap_err();
    assert!(matches!(err, WriteError::DepthExceeded(2)));
    assert!(!state.is_poisoned());
}

#[test]
fn frame_mismatch_poisons() {
    let writer = ResourceWriter::new();
    let customer = Customer::plain();
    let mut state = WriteState::new();
    state.push(Frame::Collection(CollectionFrame::default()));
    let mut sink = JsonSink::new(Vec::<u8>::new(), 1024);

    let err = writer.write_resource(&customer, &mut state, &mut sink).unwrap_err();
    assert!(matches!(err, WriteError::FrameMismatch { depth: 0, .. }));
    assert!(state.is_poisoned());
    #[cfg(feature = "debug")]
    assert_eq!(state.failure_path(), Some("[0]"));

    assert!(matches!(
        writer.write_resource(&customer, &mut state, &mut sink),
        Err(WriteError::Poisoned)
    ));

    state.reset();
    let mut sink = JsonSink::new(Vec::<u8>::new(), 1024);
    assert!(writer.write_resource(&customer, &mut state, &mut sink).unwrap());
}

#[test]
fn flush_failure_poisons() {
    struct Broken;

    impl io::Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let writer = ResourceWriter::new();
    let mut state = WriteState::new();
    let mut sink = JsonSink::new(Broken, 4);

    let err = writer.write_to_end(&doc(), &mut state, &mut sink).unwrap_err();
    assert!(matches!(err, WriteError::Sink(_)));
    assert!(state.is_poisoned());
}

#[test]
fn annotation_kind_mismatch() {
    #[derive(Resource)]
    #[resource(count_writer = Wrong::count)]
    struct Wrong {
        v: i32,
    }

    impl Wrong {
        fn count(_: &Wrong, writer: AnnotationWriter<'_>) -> Result<(), WriteError> {
            writer.write_text("many")
        }
    }

    let writer = ResourceWriter::new();
    let mut state = WriteState::new();
    let mut sink = JsonSink::new(Vec::<u8>::new(), 1024);
    let err = writer.write_resource(&Wrong { v: 1 }, &mut state, &mut sink).unwrap_err();
    assert!(matches!(err, WriteError::AnnotationKindMismatch { attempted: "text", .. }));
}

#[test]
fn write_any_uses_registered_types() {
    let factory = MetadataFactory::new();
    factory.register::<Customer>().unwrap();
    let writer = ResourceWriter::with_factory(&factory);
    let customer = Customer::plain();

    let (output, _) = run(2, |state, sink| writer.write_any(&customer, state, sink));
    assert_eq!(output, r#"{"Id":1,"Name":"Ann"}"#);

    let mut state = WriteState::new();
    let mut sink = JsonSink::new(Vec::<u8>::new(), 1024);
    assert!(matches!(
        writer.write_any(&3_i32, &mut state, &mut sink),
        Err(WriteError::Meta(MetaError::UnregisteredType(_)))
    ));
}

// -----------------------------------------------------------------------------
// Async

#[test]
fn async_write() {
    let writer = ResourceWriter::new();
    let doc = doc();
    let whole = write_once(&writer, &doc);

    let mut state = WriteState::new();
    let mut sink = JsonSink::new(Vec::<u8>::new(), 16);
    let cancel = CancellationFlag::new();
    futures_lite::future::block_on(writer.write_resource_async(&doc, &mut state, &mut sink, &cancel))
        .unwrap();

    assert!(state.is_idle());
    assert_eq!(String::from_utf8(sink.into_inner().unwrap()).unwrap(), whole);
}

#[test]
fn async_cancellation() {
    let writer = ResourceWriter::new();
    let mut state = WriteState::new();
    let mut sink = JsonSink::new(Vec::<u8>::new(), 16);
    let cancel = CancellationFlag::new();
    cancel.cancel();

    let result = futures_lite::future::block_on(writer.write_resource_async(
        &doc(),
        &mut state,
        &mut sink,
        &cancel,
    ));
    assert!(matches!(result, Err(WriteError::Cancelled)));
    assert!(state.is_idle());
    assert!(sink.buffered().is_empty());
}
