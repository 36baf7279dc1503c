//! Built-in naming epochs
//!
//! Newest schemes first. Obfuscated names belong to the release listed in
//! the epoch name.

use super::{Epoch, EpochTable};
use crate::role::Role;

fn mojmap() -> Epoch {
    Epoch::new("mojmap")
        .with(Role::RootType, &["net.minecraft.client.Minecraft"])
        .with(Role::PlayerType, &["net.minecraft.client.player.LocalPlayer"])
        .with(
            Role::PlayerBaseType,
            &["net.minecraft.world.entity.player.Player"],
        )
        .with(Role::EntityType, &["net.minecraft.world.entity.Entity"])
        .with(
            Role::WorldType,
            &["net.minecraft.client.multiplayer.ClientLevel"],
        )
        .with(Role::ScreenType, &["net.minecraft.client.gui.screens.Screen"])
        .with(Role::RootInstance, &["instance"])
        .with(Role::RootGetter, &["getInstance"])
        .with(Role::ActiveScreen, &["screen"])
        .with(Role::LocalPlayer, &["player"])
        .with(Role::ActiveWorld, &["level"])
        .with(Role::EntityHealth, &["getHealth"])
        .with(Role::EntityYaw, &["getYRot"])
        .with(Role::ActivePlayerList, &["players"])
        .with_behaviour(Role::ActiveScreen, &["render", "renderBackground"])
}

fn yarn() -> Epoch {
    Epoch::new("yarn")
        .with(Role::RootType, &["net.minecraft.client.MinecraftClient"])
        .with(
            Role::PlayerType,
            &["net.minecraft.client.network.ClientPlayerEntity"],
        )
        .with(
            Role::PlayerBaseType,
            &["net.minecraft.entity.player.PlayerEntity"],
        )
        .with(Role::EntityType, &["net.minecraft.entity.Entity"])
        .with(Role::WorldType, &["net.minecraft.client.world.ClientWorld"])
        .with(Role::ScreenType, &["net.minecraft.client.gui.screen.Screen"])
        .with(Role::RootInstance, &["instance"])
        .with(Role::RootGetter, &["getInstance"])
        .with(Role::ActiveScreen, &["currentScreen"])
        .with(Role::LocalPlayer, &["player"])
        .with(Role::ActiveWorld, &["world"])
        .with(Role::EntityHealth, &["getHealth"])
        .with(Role::EntityYaw, &["getYaw"])
        .with(Role::ActivePlayerList, &["players"])
        .with_behaviour(Role::ActiveScreen, &["render", "renderBackground"])
}

fn intermediary() -> Epoch {
    Epoch::new("intermediary")
        .with(Role::RootType, &["net.minecraft.class_310"])
        .with(Role::PlayerType, &["net.minecraft.class_746"])
        .with(Role::PlayerBaseType, &["net.minecraft.class_1657"])
        .with(Role::EntityType, &["net.minecraft.class_1297"])
        .with(Role::WorldType, &["net.minecraft.class_638"])
        .with(Role::ScreenType, &["net.minecraft.class_437"])
        .with(Role::RootInstance, &["field_1700"])
        .with(Role::RootGetter, &["method_1551"])
        .with(Role::ActiveScreen, &["field_1755"])
        .with(Role::LocalPlayer, &["field_1724"])
        .with(Role::ActiveWorld, &["field_1687"])
        .with(Role::EntityHealth, &["method_6032"])
        .with(Role::EntityYaw, &["method_36454"])
        .with(Role::ActivePlayerList, &["field_18226"])
        .with_behaviour(Role::ActiveScreen, &["method_25394", "method_25420"])
}

fn mcp() -> Epoch {
    Epoch::new("mcp")
        .with(Role::RootType, &["net.minecraft.client.Minecraft"])
        .with(
            Role::PlayerType,
            &["net.minecraft.client.entity.EntityPlayerSP"],
        )
        .with(
            Role::PlayerBaseType,
            &["net.minecraft.entity.player.EntityPlayer"],
        )
        .with(Role::EntityType, &["net.minecraft.entity.Entity"])
        .with(
            Role::WorldType,
            &["net.minecraft.client.multiplayer.WorldClient"],
        )
        .with(Role::ScreenType, &["net.minecraft.client.gui.GuiScreen"])
        .with(Role::RootInstance, &["theMinecraft"])
        .with(Role::RootGetter, &["getMinecraft"])
        .with(Role::ActiveScreen, &["currentScreen"])
        .with(Role::LocalPlayer, &["thePlayer"])
        .with(Role::ActiveWorld, &["theWorld"])
        .with(Role::EntityPositionX, &["posX"])
        .with(Role::EntityPositionY, &["posY"])
        .with(Role::EntityPositionZ, &["posZ"])
        .with(Role::EntityHealth, &["getHealth"])
        .with(Role::EntityYaw, &["getRotationYawHead"])
        .with(Role::ActivePlayerList, &["playerEntities"])
        .with(Role::ActiveEntityList, &["loadedEntityList"])
        .with_behaviour(
            Role::ActiveScreen,
            &["drawScreen", "drawDefaultBackground"],
        )
}

fn srg() -> Epoch {
    Epoch::new("srg")
        .with(Role::RootInstance, &["field_71432_P"])
        .with(Role::RootGetter, &["func_71410_x"])
        .with(Role::ActiveScreen, &["field_71462_r"])
        .with(Role::LocalPlayer, &["field_71439_g"])
        .with(Role::ActiveWorld, &["field_71441_e"])
        .with(Role::EntityPositionX, &["field_70165_t"])
        .with(Role::EntityPositionY, &["field_70163_u"])
        .with(Role::EntityPositionZ, &["field_70161_v"])
        .with(Role::EntityHealth, &["func_110143_aJ"])
        .with(Role::EntityYaw, &["func_70079_am"])
        .with(Role::ActivePlayerList, &["field_73010_i"])
        .with(Role::ActiveEntityList, &["field_72996_f"])
        .with_behaviour(Role::ActiveScreen, &["func_73863_a", "func_146276_q_"])
}

fn notch_1_8_9() -> Epoch {
    Epoch::new("notch-1.8.9")
        .with(Role::RootType, &["ave"])
        .with(Role::PlayerType, &["bew"])
        .with(Role::PlayerBaseType, &["wn"])
        .with(Role::EntityType, &["pk"])
        .with(Role::WorldType, &["bdb"])
        .with(Role::ScreenType, &["axu"])
        .with(Role::RootInstance, &["S"])
        .with(Role::RootGetter, &["A"])
        .with(Role::ActiveScreen, &["m"])
        .with(Role::LocalPlayer, &["h"])
        .with(Role::ActiveWorld, &["f"])
        .with(Role::EntityPositionX, &["s"])
        .with(Role::EntityPositionY, &["t"])
        .with(Role::EntityPositionZ, &["u"])
        .with(Role::EntityHealth, &["bn", "bj"])
        .with(Role::EntityYaw, &["aI"])
        .with(Role::ActivePlayerList, &["j"])
        .with(Role::ActiveEntityList, &["f"])
}

pub(super) fn table() -> EpochTable {
    EpochTable {
        epochs: vec![mojmap(), yarn(), intermediary(), mcp(), srg(), notch_1_8_9()],
    }
}
