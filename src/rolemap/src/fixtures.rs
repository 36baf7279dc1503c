//! Synthetic host universes for tests
//!
//! One game layout rendered under different naming schemes. Only names
//! change between schemes; declaration order, and therefore every handle,
//! stays the same.

use crate::host::{ObjectEntry, Snapshot, SnapshotHost, TypeEntry};
use crate::model::{ObjectRef, Value};

pub struct Naming {
    pub minecraft: &'static str,
    pub instance: &'static str,
    pub getter: &'static str,
    pub screen_field: &'static str,
    pub player_field: &'static str,
    pub world_field: &'static str,
    pub settings: &'static str,
    pub entity: &'static str,
    pub living: &'static str,
    pub player_base: &'static str,
    pub abstract_player: &'static str,
    pub player_sp: &'static str,
    pub other_player: &'static str,
    pub zombie: &'static str,
    pub world: &'static str,
    pub world_client: &'static str,
    pub gui_screen: &'static str,
    pub gui_chat: &'static str,
    pub pos: [&'static str; 3],
    pub get_health: &'static str,
    pub get_max_health: &'static str,
    pub get_yaw: &'static str,
    pub draw: &'static str,
    pub entities_list: &'static str,
    pub players_list: &'static str,
    pub spawn_queue: &'static str,
}

impl Naming {
    pub fn mcp() -> Self {
        Self {
            minecraft: "net.minecraft.client.Minecraft",
            instance: "theMinecraft",
            getter: "getMinecraft",
            screen_field: "currentScreen",
            player_field: "thePlayer",
            world_field: "theWorld",
            settings: "net.minecraft.client.settings.GameSettings",
            entity: "net.minecraft.entity.Entity",
            living: "net.minecraft.entity.EntityLivingBase",
            player_base: "net.minecraft.entity.player.EntityPlayer",
            abstract_player: "net.minecraft.client.entity.AbstractClientPlayer",
            player_sp: "net.minecraft.client.entity.EntityPlayerSP",
            other_player: "net.minecraft.client.entity.EntityOtherPlayerMP",
            zombie: "net.minecraft.entity.monster.EntityZombie",
            world: "net.minecraft.world.World",
            world_client: "net.minecraft.client.multiplayer.WorldClient",
            gui_screen: "net.minecraft.client.gui.GuiScreen",
            gui_chat: "net.minecraft.client.gui.GuiChat",
            pos: ["posX", "posY", "posZ"],
            get_health: "getHealth",
            get_max_health: "getMaxHealth",
            get_yaw: "getRotationYawHead",
            draw: "drawScreen",
            entities_list: "loadedEntityList",
            players_list: "playerEntities",
            spawn_queue: "entitySpawnQueue",
        }
    }

    pub fn notch() -> Self {
        Self {
            minecraft: "ave",
            instance: "S",
            getter: "A",
            screen_field: "m",
            player_field: "h",
            world_field: "f",
            settings: "avh",
            entity: "pk",
            living: "pr",
            player_base: "wn",
            abstract_player: "bet",
            player_sp: "bew",
            other_player: "bex",
            zombie: "we",
            world: "adm",
            world_client: "bdb",
            gui_screen: "axu",
            gui_chat: "awv",
            pos: ["s", "t", "u"],
            get_health: "bn",
            get_max_health: "bu",
            get_yaw: "aI",
            draw: "a",
            entities_list: "f",
            players_list: "j",
            spawn_queue: "M",
        }
    }

    /// Names no table knows, except the screen's render behaviour
    pub fn unknown() -> Self {
        Self {
            minecraft: "zz.k0",
            instance: "q0",
            getter: "q1",
            screen_field: "q2",
            player_field: "q3",
            world_field: "q4",
            settings: "zz.k1",
            entity: "zz.k2",
            living: "zz.k3",
            player_base: "zz.k4",
            abstract_player: "zz.k5",
            player_sp: "zz.k6",
            other_player: "zz.k7",
            zombie: "zz.k8",
            world: "zz.k9",
            world_client: "zz.k10",
            gui_screen: "zz.k11",
            gui_chat: "zz.k12",
            pos: ["q5", "q6", "q7"],
            get_health: "q8",
            get_max_health: "q9",
            get_yaw: "q10",
            draw: "render",
            entities_list: "q11",
            players_list: "q12",
            spawn_queue: "q13",
        }
    }
}

pub const ROOT: ObjectRef = ObjectRef(1);
pub const SCREEN: ObjectRef = ObjectRef(2);
pub const LOCAL_PLAYER: ObjectRef = ObjectRef(10);
pub const OTHER_PLAYER: ObjectRef = ObjectRef(11);
pub const ZOMBIE: ObjectRef = ObjectRef(12);
pub const WORLD: ObjectRef = ObjectRef(20);
pub const ENTITY_LIST: ObjectRef = ObjectRef(30);
pub const PLAYER_LIST: ObjectRef = ObjectRef(31);
pub const SPAWN_QUEUE: ObjectRef = ObjectRef(32);

fn obj(r: ObjectRef) -> Value {
    Value::Object(r)
}

fn entity(id: u32, class: &str, n: &Naming, pos: [f64; 3], health: f32) -> ObjectEntry {
    ObjectEntry::new(id, class)
        .with(n.pos[0], Value::Double(pos[0]))
        .with(n.pos[1], Value::Double(pos[1]))
        .with(n.pos[2], Value::Double(pos[2]))
        .returning(n.get_health, Value::Float(health))
}

/// The game universe under the given naming
pub fn game(n: &Naming) -> Snapshot {
    Snapshot::default()
        .with_type(TypeEntry::new("java.util.Collection"))
        .with_type(TypeEntry::new("java.util.List").implements("java.util.Collection"))
        .with_type(TypeEntry::new("java.util.ArrayList").implements("java.util.List"))
        .with_type(
            TypeEntry::new(n.entity)
                .field("entityId", "int")
                .field(n.pos[0], "double")
                .field(n.pos[1], "double")
                .field(n.pos[2], "double")
                .field("motionX", "double")
                .field("motionY", "double")
                .field("motionZ", "double")
                .field("rotationYaw", "float")
                .method("getEntityId", &[], "int"),
        )
        .with_type(
            TypeEntry::new(n.living)
                .extends(n.entity)
                .field("health", "float")
                .method(n.get_health, &[], "float")
                .method(n.get_max_health, &[], "float")
                .method(n.get_yaw, &[], "float"),
        )
        .with_type(
            TypeEntry::new(n.player_base)
                .extends(n.living)
                .field("inventory", "java.lang.Object")
                .method("isSneaking", &[], "boolean"),
        )
        .with_type(TypeEntry::new(n.abstract_player).extends(n.player_base))
        .with_type(
            TypeEntry::new(n.player_sp)
                .extends(n.abstract_player)
                .field("lastReportedPosX", "double")
                .field("lastReportedPosY", "double")
                .field("lastReportedPosZ", "double"),
        )
        .with_type(TypeEntry::new(n.other_player).extends(n.abstract_player))
        .with_type(TypeEntry::new(n.zombie).extends(n.living))
        .with_type(
            TypeEntry::new(n.world)
                .field(n.entities_list, "java.util.List")
                .field(n.players_list, "java.util.List")
                .field("isRemote", "boolean"),
        )
        .with_type(
            TypeEntry::new(n.world_client)
                .extends(n.world)
                .field(n.spawn_queue, "java.util.List"),
        )
        .with_type(
            TypeEntry::new(n.gui_screen)
                .field("width", "int")
                .method(n.draw, &["int", "int", "float"], "void")
                .method("initGui", &[], "void"),
        )
        .with_type(TypeEntry::new(n.gui_chat).extends(n.gui_screen))
        .with_type(TypeEntry::new(n.settings).filler_fields("opt", 4))
        .with_type(
            TypeEntry::new("zz.Helper")
                .static_field("INSTANCE", "zz.Helper")
                .filler_fields("h", 4),
        )
        .with_type(
            TypeEntry::new(n.minecraft)
                .static_field(n.instance, n.minecraft)
                .field("gameSettings", n.settings)
                .field(n.screen_field, n.gui_screen)
                .field(n.player_field, n.player_sp)
                .field(n.world_field, n.world_client)
                .filler_fields("state", 20)
                .static_method(n.getter, &[], n.minecraft),
        )
        .with_object(
            ObjectEntry::new(ROOT.0, n.minecraft)
                .with(n.screen_field, obj(SCREEN))
                .with(n.player_field, obj(LOCAL_PLAYER))
                .with(n.world_field, obj(WORLD)),
        )
        .with_object(ObjectEntry::new(SCREEN.0, n.gui_chat))
        .with_object(
            entity(LOCAL_PLAYER.0, n.player_sp, n, [1.5, 64.0, -3.25], 20.0)
                .returning(n.get_yaw, Value::Float(90.0)),
        )
        .with_object(entity(OTHER_PLAYER.0, n.other_player, n, [10.0, 65.0, 2.0], 15.0))
        .with_object(entity(ZOMBIE.0, n.zombie, n, [4.0, 64.0, -8.0], 8.0))
        .with_object(
            ObjectEntry::new(WORLD.0, n.world_client)
                .with(n.entities_list, obj(ENTITY_LIST))
                .with(n.players_list, obj(PLAYER_LIST))
                .with(n.spawn_queue, obj(SPAWN_QUEUE)),
        )
        .with_object(ObjectEntry::new(ENTITY_LIST.0, "java.util.ArrayList").elements(vec![
            obj(LOCAL_PLAYER),
            obj(OTHER_PLAYER),
            obj(ZOMBIE),
        ]))
        .with_object(
            ObjectEntry::new(PLAYER_LIST.0, "java.util.ArrayList")
                .elements(vec![obj(LOCAL_PLAYER), obj(OTHER_PLAYER)]),
        )
        .with_object(ObjectEntry::new(SPAWN_QUEUE.0, "java.util.ArrayList").elements(vec![]))
        .with_static(n.minecraft, n.instance, obj(ROOT))
}

pub fn game_host(n: &Naming) -> SnapshotHost {
    SnapshotHost::from_snapshot(game(n)).expect("fixture snapshot is valid")
}
