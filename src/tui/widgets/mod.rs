pub mod region_info;
pub mod region_list;
pub mod world_map;
