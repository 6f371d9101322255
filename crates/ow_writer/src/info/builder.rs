use ow_utils::hash::HashMap;

use crate::MetaError;
use crate::info::{AnnotationAccessor, AnnotationKind, AnnotationSet, ContainerAccessor};
use crate::info::MemberInfo;
use crate::info::{PropertyInfo, TypeInfo};
use crate::select::{FixedListSelector, PropertySelector};
use crate::value::WriteValue;

/// Collects the description of a resource type and validates it into a [`TypeInfo`].
///
/// Configuration mistakes made through the chained methods are remembered and
/// reported by [`build`](Self::build); the first one wins.
pub struct TypeInfoBuilder<T: 'static> {
    type_name: &'static str,
    members: Vec<Box<dyn MemberInfo<T>>>,
    annotations: AnnotationSet<T>,
    custom_annotations: Option<ContainerAccessor<T>>,
    dynamic_properties: Option<ContainerAccessor<T>>,
    before_serialize: Option<fn(&T)>,
    after_serialize: Option<fn(&T)>,
    selector: Option<Box<dyn PropertySelector<T>>>,
    error: Option<MetaError>,
}

impl<T: 'static> TypeInfoBuilder<T> {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            members: Vec::new(),
            annotations: AnnotationSet::new(),
            custom_annotations: None,
            dynamic_properties: None,
            before_serialize: None,
            after_serialize: None,
            selector: None,
            error: None,
        }
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Appends a fully configured property.
    pub fn member<V: WriteValue + 'static>(&mut self, info: PropertyInfo<T, V>) -> &mut Self {
        self.members.push(Box::new(info));
        self
    }

    /// Appends a plain property.
    pub fn property<V: WriteValue + 'static>(&mut self, name: &str, getter: fn(&T) -> &V) -> &mut Self {
        match PropertyInfo::new(name, getter) {
            Ok(info) => self.member(info),
            Err(err) => self.fail(err),
        }
    }

    /// Sets a resource-level annotation.
    pub fn annotation(&mut self, kind: AnnotationKind, accessor: AnnotationAccessor<T>) -> &mut Self {
        match self.annotations.insert(kind, accessor, self.type_name) {
            Ok(()) => self,
            Err(err) => self.fail(err),
        }
    }

    /// Sets the container whose entries are written as `@term` annotations.
    pub fn custom_annotations(&mut self, accessor: ContainerAccessor<T>) -> &mut Self {
        self.custom_annotations = Some(accessor);
        self
    }

    /// Sets the container whose entries are written as open properties.
    pub fn dynamic_properties(&mut self, accessor: ContainerAccessor<T>) -> &mut Self {
        self.dynamic_properties = Some(accessor);
        self
    }

    pub fn before_serialize(&mut self, hook: fn(&T)) -> &mut Self {
        self.before_serialize = Some(hook);
        self
    }

    pub fn after_serialize(&mut self, hook: fn(&T)) -> &mut Self {
        self.after_serialize = Some(hook);
        self
    }

    /// Replaces the default selector, which writes every property in declaration order.
    pub fn selector(&mut self, selector: impl PropertySelector<T>) -> &mut Self {
        self.selector = Some(Box::new(selector));
        self
    }

    fn fail(&mut self, err: MetaError) -> &mut Self {
        self.error.get_or_insert(err);
        self
    }

    pub fn build(self) -> Result<TypeInfo<T>, MetaError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut index = HashMap::<Box<str>, usize>::default();
        index.reserve(self.members.len());
        for (position, member) in self.members.iter().enumerate() {
            let name = member.name().ok_or(MetaError::UnnamedProperty {
                type_name: self.type_name,
                index: position,
            })?;
            if index.contains_key(name.as_str()) {
                return Err(MetaError::DuplicateProperty {
                    type_name: self.type_name,
                    name: name.as_str().into(),
                });
            }
            index.insert(name.as_str().into(), position);
        }

        Ok(TypeInfo {
            type_name: self.type_name,
            members: self.members.into_boxed_slice(),
            index,
            annotations: self.annotations,
            custom_annotations: self.custom_annotations,
            dynamic_properties: self.dynamic_properties,
            before_serialize: self.before_serialize,
            after_serialize: self.after_serialize,
            selector: self
                .selector
                .unwrap_or_else(|| Box::new(FixedListSelector::all())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::AnnotationValue;

    struct Order {
        id: i64,
        name: String,
    }

    fn etag(_: &Order) -> Option<AnnotationValue> {
        Some(AnnotationValue::Text("W/\"1\"".into()))
    }

    fn etag_writer(
        _: &Order,
        writer: crate::info::AnnotationWriter<'_>,
    ) -> Result<(), crate::WriteError> {
        writer.write_text("W/\"1\"")
    }

    #[test]
    fn builds_in_declaration_order() {
        let mut builder = TypeInfoBuilder::<Order>::new("Order");
        builder
            .property("Id", |o: &Order| &o.id)
            .property("Name", |o: &Order| &o.name)
            .annotation(AnnotationKind::ETag, AnnotationAccessor::Value(etag));
        let info = builder.build().unwrap();

        assert_eq!(info.type_name(), "Order");
        assert_eq!(info.property_names().collect::<Vec<_>>(), ["Id", "Name"]);
        assert_eq!(info.index_of("Name"), Some(1));
        assert!(info.property::<String>("Name").is_some());
        assert!(info.property::<i64>("Name").is_none());
        assert!(info.annotations().get(AnnotationKind::ETag).is_some());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut builder = TypeInfoBuilder::<Order>::new("Order");
        builder
            .property("Id", |o: &Order| &o.id)
            .property("Id", |o: &Order| &o.name);

        assert_eq!(
            builder.build().unwrap_err(),
            MetaError::DuplicateProperty {
                type_name: "Order",
                name: "Id".into(),
            }
        );
    }

    #[test]
    fn unnamed_and_empty_names_are_rejected() {
        let mut builder = TypeInfoBuilder::<Order>::new("Order");
        builder
            .property("Id", |o: &Order| &o.id)
            .member(PropertyInfo::<Order, String>::unnamed(|o| &o.name));
        assert_eq!(
            builder.build().unwrap_err(),
            MetaError::UnnamedProperty {
                type_name: "Order",
                index: 1,
            }
        );

        let mut builder = TypeInfoBuilder::<Order>::new("Order");
        builder.property("", |o: &Order| &o.id);
        assert_eq!(builder.build().unwrap_err(), MetaError::EmptyName);
    }

    #[test]
    fn first_error_wins() {
        let mut builder = TypeInfoBuilder::<Order>::new("Order");
        builder
            .annotation(AnnotationKind::ETag, AnnotationAccessor::Value(etag))
            .annotation(AnnotationKind::ETag, AnnotationAccessor::Writer(etag_writer))
            .property("", |o: &Order| &o.id);

        assert_eq!(
            builder.build().unwrap_err(),
            MetaError::ConflictingAnnotationAccessor {
                owner: "Order".into(),
                annotation: AnnotationKind::ETag,
            }
        );
    }
}
