use tracing::debug;

use crate::error::Result;
use crate::layout::VersionLayout;
use crate::process::{AddressingMode, ReadMemory, RemoteAddress};
use crate::structs::{Client, Game, PlayerData, Unit, UnitType, World};

/// The active game and the local player, resolved fresh every tick
#[derive(Debug, Clone)]
pub struct GameInfo {
    pub game: Game,
    pub player_address: RemoteAddress,
    pub player: Unit,
    pub player_data: PlayerData,
}

/// Follow the pointer chain from the module globals to the local player.
///
/// `Ok(None)` means there is no usable game this tick (title screen, loading
/// screen, or the player is not spawned yet). Read failures are returned as
/// errors; the caller decides how to treat them.
pub fn resolve_game<R: ReadMemory>(reader: &R, layout: &VersionLayout) -> Result<Option<GameInfo>> {
    let addresses = &layout.addresses;
    let game_id = reader.read_u32(reader.resolve(addresses.game_id, AddressingMode::ModuleRelative))?;
    let world_address =
        reader.read_address(reader.resolve(addresses.world, AddressingMode::ModuleRelative))?;
    if world_address.is_null() {
        return Ok(None);
    }

    let world: World = reader.read_struct(world_address)?;
    if !world.game_buffer.is_valid() {
        debug!("World has no game buffer yet");
        return Ok(None);
    }

    let slot = layout.game_array.slot_offset(game_id, world.game_mask)?;
    let game_address = reader.read_address(world.game_buffer.offset(slot))?;
    // Holds a sign-flipped value while switching games
    if game_address.is_negative() {
        debug!("Game pointer {} not ready", game_address);
        return Ok(None);
    }
    if game_address.is_null() {
        return Ok(None);
    }

    let game: Game = reader.read_struct(game_address)?;
    if !game.client.is_valid() {
        return Ok(None);
    }

    let client: Client = reader.read_struct(game.client)?;
    if client.unit_type != UnitType::Player as u32 {
        debug!("Client controls a non-player unit ({})", client.unit_type);
        return Ok(None);
    }

    let player_address = game.player_unit(client.unit_id);
    if !player_address.is_valid() {
        return Ok(None);
    }
    let player: Unit = reader.read_struct(player_address)?;
    if !player.unit_data.is_valid() {
        return Ok(None);
    }
    let player_data: PlayerData = reader.read_struct(player.unit_data)?;

    Ok(Some(GameInfo {
        game,
        player_address,
        player,
        player_data,
    }))
}
