//! Catalogue of the commands the editor plugin is known to handle.
//!
//! The bridge forwards any method name; this list only documents the
//! common ones for front-ends (`GET /commands`, `godot-bridge commands`).

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandCategory {
    Scene,
    Node,
    Property,
    Script,
    Resource,
    Project,
    Notification,
    Query,
    Editor,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandSpec {
    pub name: &'static str,
    pub category: CommandCategory,
    pub description: &'static str,
    pub params: &'static [&'static str],
}

const fn cmd(
    name: &'static str,
    category: CommandCategory,
    description: &'static str,
    params: &'static [&'static str],
) -> CommandSpec {
    CommandSpec {
        name,
        category,
        description,
        params,
    }
}

use CommandCategory::*;

pub static COMMANDS: &[CommandSpec] = &[
    // ── Scene ────────────────────────────────────────────────────────
    cmd("create_scene", Scene, "Create a new scene", &["template"]),
    cmd("open_scene", Scene, "Open a scene", &["path"]),
    cmd("save_scene", Scene, "Save the current scene", &["path"]),
    cmd("close_scene", Scene, "Close the current scene", &[]),
    // ── Node ─────────────────────────────────────────────────────────
    cmd(
        "add_node",
        Node,
        "Add a node to the scene tree",
        &["parentPath", "nodeType", "nodeName"],
    ),
    cmd("remove_node", Node, "Remove a node", &["node_path"]),
    cmd("select_node", Node, "Select a node in the editor", &["node_path"]),
    cmd("duplicate_node", Node, "Duplicate a node", &["node_path"]),
    cmd("rename_node", Node, "Rename a node", &["node_path", "new_name"]),
    // ── Property ─────────────────────────────────────────────────────
    cmd(
        "set_property",
        Property,
        "Set a node property",
        &["node_path", "property", "value"],
    ),
    cmd(
        "get_property",
        Property,
        "Read a node property",
        &["node_path", "property"],
    ),
    cmd(
        "update_property",
        Property,
        "Update a node property",
        &["nodePath", "property", "value"],
    ),
    // ── Script ───────────────────────────────────────────────────────
    cmd("create_script", Script, "Create a script file", &["path", "content"]),
    cmd(
        "attach_script",
        Script,
        "Attach a script to a node",
        &["node_path", "script_path"],
    ),
    cmd(
        "edit_script",
        Script,
        "Replace a script's content",
        &["script_path", "content"],
    ),
    // ── Resource ─────────────────────────────────────────────────────
    cmd("import_resource", Resource, "Import a resource", &["path"]),
    cmd("create_resource", Resource, "Create a resource", &["type", "path"]),
    cmd("use_resource", Resource, "Assign a resource to a node", &["node_path", "resource_path"]),
    // ── Project ──────────────────────────────────────────────────────
    cmd("build_project", Project, "Build the project", &[]),
    cmd("run_project", Project, "Run the project", &[]),
    cmd("stop_project", Project, "Stop the running project", &[]),
    // ── Notification ─────────────────────────────────────────────────
    cmd("notify", Notification, "Show a notification", &["message", "level"]),
    cmd(
        "notify_message",
        Notification,
        "Show a message in the editor",
        &["message", "type"],
    ),
    // ── Query ────────────────────────────────────────────────────────
    cmd("get_scene_tree", Query, "Fetch the current scene tree", &[]),
    cmd("get_node_info", Query, "Fetch details about a node", &["nodePath"]),
    cmd("get_resources", Query, "List project resources", &[]),
    cmd("get_editor_logs", Query, "Fetch recent editor log output", &[]),
    // ── Editor ───────────────────────────────────────────────────────
    cmd(
        "execute_command",
        Editor,
        "Run an editor command by name",
        &["command"],
    ),
];

/// Look up a command by exact name.
pub fn find(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|c| c.name == name)
}
