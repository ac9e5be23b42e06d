//! Components attached to entities.
//!
//! The set of kinds is closed: [`Component`] holds one decoded component and
//! [`ComponentKind`] names it. The kind's `Display`/`FromStr` form is the
//! name the game registers the component under.

mod basic;
mod buffs;
mod life;
mod mods;
mod render;

use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::context::Context;
use crate::error::Result;
use crate::remote::RemoteObject;

pub use basic::{
    Chest, DiesAfterTime, MinimapIcon, Player, Positioned, Shrine, Targetable,
    TriggerableBlockage, WorldItem,
};
pub use buffs::{Buffs, StatusEffect};
pub use life::{Life, Vital};
pub use mods::{ModValues, Mods, ObjectMagicProperties};
pub use render::Render;

/// Typed access to one variant of [`Component`]
pub trait ComponentView: Sized {
    const KIND: ComponentKind;

    fn view(component: &Component) -> Option<&Self>;
}

macro_rules! components {
    ($($name:ident),+ $(,)?) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter, EnumString, IntoStaticStr, Display,
        )]
        pub enum ComponentKind {
            $($name),+
        }

        #[derive(Debug, Clone, PartialEq)]
        pub enum Component {
            $($name($name)),+
        }

        impl Component {
            /// Undecoded component of `kind`
            pub fn new(kind: ComponentKind) -> Self {
                match kind {
                    $(ComponentKind::$name => Component::$name($name::default())),+
                }
            }

            pub fn kind(&self) -> ComponentKind {
                match self {
                    $(Component::$name(_) => ComponentKind::$name),+
                }
            }

            /// Address of the entity this component claims to belong to
            pub fn owner_entity(&self) -> u64 {
                match self {
                    $(Component::$name(inner) => inner.owner),+
                }
            }
        }

        impl RemoteObject for Component {
            fn update(&mut self, ctx: &Context, address: u64, has_address_changed: bool) -> Result<()> {
                match self {
                    $(Component::$name(inner) => inner.update(ctx, address, has_address_changed)),+
                }
            }

            fn cleanup(&mut self) {
                match self {
                    $(Component::$name(inner) => inner.cleanup()),+
                }
            }
        }

        $(
            impl ComponentView for $name {
                const KIND: ComponentKind = ComponentKind::$name;

                fn view(component: &Component) -> Option<&Self> {
                    match component {
                        Component::$name(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )+
    };
}

components!(
    Render,
    Life,
    Chest,
    Player,
    Shrine,
    Positioned,
    Targetable,
    Buffs,
    DiesAfterTime,
    TriggerableBlockage,
    MinimapIcon,
    WorldItem,
    ObjectMagicProperties,
    Mods,
);

impl ComponentKind {
    pub fn name(&self) -> &'static str {
        self.into()
    }
}
