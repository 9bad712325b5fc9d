/*
 *  lib.rs
 *
 *  CoverHat - artwork on a hat
 *  (c) 2020-26 Stuart Hunter
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

pub mod artwork;
pub mod buttons;
pub mod config;
pub mod constants;
pub mod display;
pub mod draw;
pub mod engine;
pub mod fetcher;
pub mod frame_cell;
pub mod playback;
pub mod render;
pub mod spotify;
pub mod ui_state;
pub mod vframebuf;
