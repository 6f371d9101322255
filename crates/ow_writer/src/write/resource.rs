use core::any::Any;

use crate::WriteError;
use crate::info::{AnnotationKind, TypeInfo, write_annotation};
use crate::resolve::EntryTarget;
use crate::select::PropertySelector;
use crate::state::{Cursor, Frame, FrameKind, MemberProgress, ResourceFrame, ResourceStage};
use crate::write::WriteContext;

/// Writes one resource as an object, resuming from its frame if one is stored.
///
/// Output order: resource-level annotations, custom annotations, the
/// properties chosen by `selector` (or the type's own), open properties.
pub(crate) fn write_resource_body<T: 'static>(
    info: &TypeInfo<T>,
    selector: Option<&dyn PropertySelector<T>>,
    resource: &T,
    cx: &mut WriteContext<'_>,
) -> Result<bool, WriteError> {
    cx.enter(FrameKind::Resource, |suppressed| {
        Frame::Resource(ResourceFrame::new(info.type_name(), suppressed))
    })?;
    let selector = selector.unwrap_or_else(|| info.selector());
    let done = write_stages(info, selector, resource, cx)?;
    cx.leave(done);
    Ok(done)
}

fn write_stages<T: 'static>(
    info: &TypeInfo<T>,
    selector: &dyn PropertySelector<T>,
    resource: &T,
    cx: &mut WriteContext<'_>,
) -> Result<bool, WriteError> {
    loop {
        let frame = cx.resource_frame()?;
        let (stage, suppressed) = (frame.stage, frame.suppressed);

        let next = match stage {
            ResourceStage::NotStarted => {
                if let Some(hook) = info.before_serialize() {
                    hook(resource);
                }
                cx.sink().begin_object()?;
                ResourceStage::Annotations(0)
            }
            ResourceStage::Annotations(slot) => match AnnotationKind::ALL.get(slot as usize) {
                Some(&kind) => {
                    if let Some(accessor) = info.annotations().get(kind)
                        && !suppressed.contains(kind.mask())
                    {
                        if cx.should_suspend() {
                            return Ok(false);
                        }
                        write_annotation(accessor, resource, None, kind, cx.sink())?;
                    }
                    ResourceStage::Annotations(slot + 1)
                }
                None => ResourceStage::CustomAnnotations,
            },
            ResourceStage::CustomAnnotations => {
                if let Some(container) = info.custom_annotations()
                    && !write_container(info, container(resource), EntryTarget::Annotation, cx)?
                {
                    return Ok(false);
                }
                ResourceStage::Members
            }
            ResourceStage::Members => {
                if !selector.write_properties(info, resource, cx)? {
                    return Ok(false);
                }
                let frame = cx.resource_frame()?;
                frame.members = Cursor::NotStarted;
                frame.progress = MemberProgress::NotStarted;
                ResourceStage::DynamicMembers
            }
            ResourceStage::DynamicMembers => {
                if let Some(container) = info.dynamic_properties()
                    && !write_container(info, container(resource), EntryTarget::OpenProperty, cx)?
                {
                    return Ok(false);
                }
                cx.sink().end_object()?;
                if let Some(hook) = info.after_serialize() {
                    hook(resource);
                }
                ResourceStage::Complete
            }
            ResourceStage::Complete => return Ok(true),
        };
        cx.resource_frame()?.stage = next;
    }
}

fn write_container<T: 'static>(
    info: &TypeInfo<T>,
    container: &dyn Any,
    target: EntryTarget,
    cx: &mut WriteContext<'_>,
) -> Result<bool, WriteError> {
    let handler = cx
        .resolver()
        .resolve(container)
        .ok_or(WriteError::NoHandler(info.type_name()))?;
    handler.write_entries(container, target, cx)
}
