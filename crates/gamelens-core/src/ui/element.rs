use tracing::warn;

use crate::cache::UiElementParents;
use crate::context::Context;
use crate::error::Result;
use crate::memory::NativeRead;
use crate::memory::layout::ui::{MODIFY_POSITION_FLAG, UiElementBaseOffset, VISIBLE_FLAG};
use crate::remote::{Remote, RemoteObject};
use crate::ui::GameScale;

/// Longest ancestor chain walked when resolving positions and ids
pub const MAX_UI_DEPTH: usize = 64;

/// Node of the game's UI tree
#[derive(Debug, Clone, PartialEq)]
pub struct UiElementBase {
    id: String,
    parent_address: u64,
    children: Vec<u64>,
    position_modifier: [f32; 2],
    relative_position: [f32; 2],
    unscaled_size: [f32; 2],
    local_scale_multiplier: f32,
    flags: u32,
    scale_index: u8,
}

impl Default for UiElementBase {
    fn default() -> Self {
        Self {
            id: String::new(),
            parent_address: 0,
            children: Vec::new(),
            position_modifier: [0.0; 2],
            relative_position: [0.0; 2],
            unscaled_size: [0.0; 2],
            local_scale_multiplier: 1.0,
            flags: 0,
            scale_index: 0,
        }
    }
}

impl UiElementBase {
    /// Apply a decoded record. The id is only re-read when the address changed.
    pub(crate) fn apply(
        &mut self,
        ctx: &Context,
        address: u64,
        data: &UiElementBaseOffset,
        has_address_changed: bool,
    ) {
        if data.self_ptr != 0 && data.self_ptr != address {
            warn!(
                "Element at {:#x} is not a UI element, self pointer is {:#x}",
                address, data.self_ptr
            );
            self.cleanup();
            return;
        }

        let reader = ctx.reader();
        self.parent_address = data.parent_ptr;
        self.children = reader.read_std_vector::<u64>(&data.childrens);
        if has_address_changed {
            self.id = reader.read_wide_string(&data.id);
        }
        self.position_modifier = data.position_modifier;
        self.scale_index = data.scale_index;
        self.local_scale_multiplier = data.local_scale_multiplier;
        self.flags = data.flags;
        self.relative_position = data.relative_position;
        self.unscaled_size = data.unscaled_size;
    }

    /// Own id, without ancestors
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent_address(&self) -> u64 {
        self.parent_address
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn children(&self) -> &[u64] {
        &self.children
    }

    pub fn total_children(&self) -> usize {
        self.children.len()
    }

    /// Decode the `index`-th child, or `None` when out of range
    pub fn child(&self, ctx: &Context, index: usize) -> Result<Option<Remote<UiElementBase>>> {
        match self.children.get(index) {
            Some(&address) => Ok(Some(Remote::bind(ctx, address, UiElementBase::default())?)),
            None => Ok(None),
        }
    }

    /// Ids of every cached ancestor and this element, joined by `.`
    pub fn id_path(&self, parents: &UiElementParents) -> String {
        let mut ids = vec![self.id.as_str()];
        let mut parent = self.parent_address;
        for _ in 0..MAX_UI_DEPTH {
            let Some(element) = parents.get(parent) else {
                break;
            };
            ids.push(element.id.as_str());
            parent = element.parent_address;
        }
        ids.retain(|id| !id.is_empty());
        ids.reverse();
        ids.join(".")
    }

    /// Own visibility flag and that of every cached ancestor
    pub fn is_visible(&self, parents: &UiElementParents) -> bool {
        if self.flags & VISIBLE_FLAG == 0 {
            return false;
        }
        let mut parent = self.parent_address;
        for _ in 0..MAX_UI_DEPTH {
            let Some(element) = parents.get(parent) else {
                return true;
            };
            if element.flags & VISIBLE_FLAG == 0 {
                return false;
            }
            parent = element.parent_address;
        }
        true
    }

    pub fn size(&self, scale: &GameScale) -> [f32; 2] {
        let (width, height) = scale.scale_value(self.scale_index, self.local_scale_multiplier);
        [self.unscaled_size[0] * width, self.unscaled_size[1] * height]
    }

    /// Screen position in window pixels
    pub fn position(&self, parents: &UiElementParents, scale: &GameScale) -> [f32; 2] {
        let (width, height) = scale.scale_value(self.scale_index, self.local_scale_multiplier);
        let [x, y] = self.unscaled_position(parents, scale, 0);
        [x * width + scale.cull, y * height]
    }

    fn unscaled_position(
        &self,
        parents: &UiElementParents,
        scale: &GameScale,
        depth: usize,
    ) -> [f32; 2] {
        if self.parent_address == 0 || depth >= MAX_UI_DEPTH {
            return self.relative_position;
        }
        let Some(parent) = parents.get(self.parent_address) else {
            return self.relative_position;
        };

        let mut parent_position = parent.unscaled_position(parents, scale, depth + 1);
        if self.flags & MODIFY_POSITION_FLAG != 0 {
            parent_position[0] += parent.position_modifier[0];
            parent_position[1] += parent.position_modifier[1];
        }

        if parent.scale_index == self.scale_index
            && parent.local_scale_multiplier == self.local_scale_multiplier
        {
            return [
                parent_position[0] + self.relative_position[0],
                parent_position[1] + self.relative_position[1],
            ];
        }

        let (parent_w, parent_h) =
            scale.scale_value(parent.scale_index, parent.local_scale_multiplier);
        let (own_w, own_h) = scale.scale_value(self.scale_index, self.local_scale_multiplier);
        [
            parent_position[0] * parent_w / own_w + self.relative_position[0],
            parent_position[1] * parent_h / own_h + self.relative_position[1],
        ]
    }
}

impl RemoteObject for UiElementBase {
    fn update(&mut self, ctx: &Context, address: u64, has_address_changed: bool) -> Result<()> {
        let data: UiElementBaseOffset = ctx.reader().read_value(address);
        self.apply(ctx, address, &data, has_address_changed);
        Ok(())
    }

    fn cleanup(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::GameStateKind;
    use crate::context::tests::context_for;
    use crate::memory::MockMemoryBuilder;
    use crate::ui::tests::{write_element, write_element_with};

    fn parents() -> UiElementParents {
        UiElementParents::new(GameStateKind::InGameState, GameStateKind::EscapeState)
    }

    #[test]
    fn test_decode_element() {
        let mut builder = MockMemoryBuilder::new();
        let root = builder.reserve(128);
        let child = builder.reserve(128);
        write_element(&mut builder, root, 0, "root", VISIBLE_FLAG);
        write_element(&mut builder, child, root, "minimap", VISIBLE_FLAG);
        let ctx = context_for(builder.build());

        let element = Remote::bind(&ctx, child, UiElementBase::default()).unwrap();
        assert_eq!(element.id(), "minimap");
        assert_eq!(element.parent_address(), root);
        assert_eq!(element.flags(), VISIBLE_FLAG);

        let mut cache = parents();
        cache.add_if_not_exists(&ctx, root);
        assert_eq!(element.id_path(&cache), "root.minimap");
        assert!(element.is_visible(&cache));
    }

    #[test]
    fn test_self_pointer_mismatch_resets() {
        let mut builder = MockMemoryBuilder::new();
        let real = builder.reserve(128);
        let copy = builder.reserve(128);
        write_element(&mut builder, real, 0, "real", VISIBLE_FLAG);
        // A copy of the record still points at the original
        write_element_with(&mut builder, copy, 0, "copy", VISIBLE_FLAG, |e| {
            e.self_ptr = real;
        });
        let ctx = context_for(builder.build());

        let element = Remote::bind(&ctx, copy, UiElementBase::default()).unwrap();
        assert_eq!(*element, UiElementBase::default());

        let element = Remote::bind(&ctx, real, UiElementBase::default()).unwrap();
        assert_eq!(element.id(), "real");
    }

    #[test]
    fn test_hidden_ancestor_hides_child() {
        let mut builder = MockMemoryBuilder::new();
        let root = builder.reserve(128);
        let child = builder.reserve(128);
        write_element(&mut builder, root, 0, "root", 0);
        write_element(&mut builder, child, root, "child", VISIBLE_FLAG);
        let ctx = context_for(builder.build());

        let element = Remote::bind(&ctx, child, UiElementBase::default()).unwrap();
        let mut cache = parents();
        assert!(element.is_visible(&cache));
        cache.add_if_not_exists(&ctx, root);
        assert!(!element.is_visible(&cache));
    }

    #[test]
    fn test_position_walks_ancestors() {
        let mut builder = MockMemoryBuilder::new();
        let root = builder.reserve(128);
        let child = builder.reserve(128);
        write_element_with(&mut builder, root, 0, "root", VISIBLE_FLAG, |e| {
            e.relative_position = [100.0, 50.0];
            e.position_modifier = [10.0, 5.0];
        });
        write_element_with(
            &mut builder,
            child,
            root,
            "child",
            VISIBLE_FLAG | MODIFY_POSITION_FLAG,
            |e| {
                e.relative_position = [20.0, 30.0];
                e.unscaled_size = [200.0, 100.0];
            },
        );
        let ctx = context_for(builder.build());

        let element = Remote::bind(&ctx, child, UiElementBase::default()).unwrap();
        let mut cache = parents();
        cache.add_if_not_exists(&ctx, root);

        let scale = GameScale::from_window(1280.0, 800.0);
        assert_eq!(element.position(&cache, &scale), [65.0, 42.5]);
        assert_eq!(element.size(&scale), [100.0, 50.0]);
    }

    #[test]
    fn test_position_converts_between_scales() {
        let mut builder = MockMemoryBuilder::new();
        let root = builder.reserve(128);
        let child = builder.reserve(128);
        write_element_with(&mut builder, root, 0, "root", VISIBLE_FLAG, |e| {
            e.relative_position = [100.0, 100.0];
            e.local_scale_multiplier = 2.0;
        });
        write_element_with(&mut builder, child, root, "child", VISIBLE_FLAG, |e| {
            e.relative_position = [10.0, 10.0];
        });
        let ctx = context_for(builder.build());

        let element = Remote::bind(&ctx, child, UiElementBase::default()).unwrap();
        let mut cache = parents();
        cache.add_if_not_exists(&ctx, root);

        let scale = GameScale::default();
        // Parent units are twice as large as the child's
        assert_eq!(element.position(&cache, &scale), [210.0, 210.0]);
    }

    #[test]
    fn test_child_lookup() {
        let mut builder = MockMemoryBuilder::new();
        let root = builder.reserve(128);
        let child = builder.reserve(128);
        let children = builder.alloc(&child.to_le_bytes());
        write_element_with(&mut builder, root, 0, "root", VISIBLE_FLAG, |e| {
            e.childrens.first = children;
            e.childrens.last = children + 8;
            e.childrens.end = children + 8;
        });
        write_element(&mut builder, child, root, "child", VISIBLE_FLAG);
        let ctx = context_for(builder.build());

        let element = Remote::bind(&ctx, root, UiElementBase::default()).unwrap();
        assert_eq!(element.total_children(), 1);
        let first = element.child(&ctx, 0).unwrap().unwrap();
        assert_eq!(first.id(), "child");
        assert!(element.child(&ctx, 1).unwrap().is_none());
    }
}
