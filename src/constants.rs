/// DOM contract and browser-side tuning constants.
///
/// Element ids are owned by the page shell; the layout engine only looks
/// them up and writes inline styles.
// Canvas root holding all page content (scaled as one rigid subtree)
pub const CANVAS_ROOT_ID: &str = "fixed-layout";
// Unscaled wrapper that receives the hard-cut height
pub const CANVAS_WRAPPER_ID: &str = "fixed-layout-wrapper";
// Optional internal scroll container
pub const SCROLL_ROOT_ID: &str = "scroll-root";
// Last narrative section; its bottom edge ends the page
pub const FINAL_SECTION_ID: &str = "final-video-section";
// Unscaled layer hosting the registry frames
pub const FRAMES_LAYER_ID: &str = "frames-overlay";
// Optional JSON override of the site config
pub const CONFIG_SCRIPT_ID: &str = "canvas-config";

// Attribute naming an anchor element
pub const ANCHOR_ATTRIBUTE: &str = "data-frame-anchor";
// Prefix of registry frame image ids
pub const OVERLAY_IMAGE_PREFIX: &str = "overlay-";

// One-shot readiness signal
pub const READY_EVENT: &str = "canvas:layout-ready";
pub const READY_GLOBAL_FLAG: &str = "__canvasLayoutReady";

// Diagnostics persistence
pub const DIAGNOSTICS_STORAGE_KEY: &str = "canvas-diagnostics";

// Anchor frames fade in once positioned
pub const ANCHOR_REVEAL_TRANSITION: &str = "opacity 0.4s ease-in-out";

// Layer stacking
pub const FRAMES_LAYER_Z_INDEX: i32 = 50;
pub const ANCHOR_FRAME_Z_INDEX: i32 = 40;
