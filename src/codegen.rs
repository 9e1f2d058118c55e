//! Codegen module for Zenith site compiler
//!
//! Generates the three runtime fragments shipped with every page and
//! assembles them with the page's own script bodies.
//!
//! ## Assembly Order
//!
//! The first script slot of a page is always
//! `text bindings → attribute bindings → user script → event dispatch`.
//! Later slots carry only their user script, so state exists before any user
//! code runs and the event system initializes exactly once per page.
//!
//! Names embedded in generated code (event kinds, binding ids, state names)
//! go through `serde_json`, and through `CSS.escape` again wherever they end
//! up inside a selector. Binding expressions are substituted verbatim.

use serde::{Deserialize, Serialize};

use crate::compose::{Binding, PageBindings, StateDeclaration};
use crate::parse::ScriptBlock;
use crate::transform::EventKindSet;

// ═══════════════════════════════════════════════════════════════════════════════
// FRAGMENT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Concatenation slot of a runtime fragment. Declaration order is assembly order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuntimeSlot {
    TextBindings,
    AttributeBindings,
    EventDispatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeFragment {
    pub slot: RuntimeSlot,
    pub code: String,
}

impl RuntimeFragment {
    fn new(slot: RuntimeSlot, code: String) -> Self {
        RuntimeFragment { slot, code }
    }

    fn empty(slot: RuntimeSlot) -> Self {
        RuntimeFragment {
            slot,
            code: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.code.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRuntime {
    pub text_bindings: RuntimeFragment,
    pub attribute_bindings: RuntimeFragment,
    pub events: RuntimeFragment,
    needs_slot: bool,
}

impl PageRuntime {
    /// Whether the page must ship a script even if its source has none.
    pub fn needs_slot(&self) -> bool {
        self.needs_slot
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledScript {
    pub index: usize,
    pub content: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHARED STATE CONTAINER
// ═══════════════════════════════════════════════════════════════════════════════

/// Idempotent setup of `window.__zenith.state`, shared by both binding runtimes.
const STATE_CONTAINER: &str = r#"  const zen = window.__zenith || (window.__zenith = {});
  if (!zen.state) {
    const subscribers = [];
    zen.subscribe = (fn) => {
      subscribers.push(fn);
      fn();
    };
    zen.state = new Proxy({}, {
      set(target, key, value) {
        target[key] = value;
        subscribers.forEach((fn) => fn(key));
        return true;
      }
    });
  }"#;

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

fn binding_reader(binding: &Binding) -> String {
    format!("function (state) {{ return ({}); }}", binding.expression)
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEXT BINDINGS
// ═══════════════════════════════════════════════════════════════════════════════

fn generate_state_seed(state: &[StateDeclaration]) -> String {
    state
        .iter()
        .map(|decl| {
            let name = js_string(&decl.name);
            format!(
                "  if (!({name} in zen.state)) zen.state[{name}] = ({value});",
                name = name,
                value = decl.initial_value
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn generate_text_binding_runtime(
    state: &[StateDeclaration],
    bindings: &[Binding],
) -> RuntimeFragment {
    if state.is_empty() && bindings.is_empty() {
        return RuntimeFragment::empty(RuntimeSlot::TextBindings);
    }

    let entries = bindings
        .iter()
        .map(|b| format!("    {{ id: {}, read: {} }},", js_string(&b.id), binding_reader(b)))
        .collect::<Vec<_>>()
        .join("\n");

    let code = format!(
        r#"// [ZENITH] text bindings
(function () {{
{container}
{seed}
  const bindings = [
{entries}
  ];
  const apply = () => {{
    for (const binding of bindings) {{
      let value;
      try {{
        value = binding.read(zen.state);
      }} catch (e) {{
        console.error('[Zenith Runtime] Text binding ' + binding.id + ' failed:', e);
        value = '';
      }}
      const text = value === undefined || value === null ? '' : String(value);
      document.querySelectorAll('[data-zen-text="' + CSS.escape(binding.id) + '"]').forEach((el) => {{
        el.textContent = text;
      }});
    }}
  }};
  zen.subscribe(apply);
}})();"#,
        container = STATE_CONTAINER,
        seed = generate_state_seed(state),
        entries = entries
    );

    RuntimeFragment::new(RuntimeSlot::TextBindings, code)
}

// ═══════════════════════════════════════════════════════════════════════════════
// ATTRIBUTE BINDINGS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn generate_attribute_binding_runtime(bindings: &[Binding]) -> RuntimeFragment {
    if bindings.is_empty() {
        return RuntimeFragment::empty(RuntimeSlot::AttributeBindings);
    }

    let entries = bindings
        .iter()
        .map(|b| {
            format!(
                "    {{ id: {}, target: {}, read: {} }},",
                js_string(&b.id),
                js_string(&b.target),
                binding_reader(b)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let code = format!(
        r#"// [ZENITH] attribute bindings
(function () {{
{container}
  const bindings = [
{entries}
  ];
  const toClass = (value) => {{
    if (Array.isArray(value)) return value.filter(Boolean).join(' ');
    if (value && typeof value === 'object') {{
      return Object.keys(value).filter((k) => value[k]).join(' ');
    }}
    return value === undefined || value === null || value === false ? '' : String(value);
  }};
  const write = (el, target, value) => {{
    if (target === 'value') {{
      el.value = value === undefined || value === null ? '' : value;
    }} else if (target === 'class' || target === 'classname') {{
      el.className = toClass(value);
    }} else if (value === false || value === undefined || value === null) {{
      el.removeAttribute(target);
    }} else {{
      el.setAttribute(target, value === true ? '' : String(value));
    }}
  }};
  const apply = () => {{
    for (const binding of bindings) {{
      let value;
      try {{
        value = binding.read(zen.state);
      }} catch (e) {{
        console.error('[Zenith Runtime] Attribute binding ' + binding.id + ' failed:', e);
        continue;
      }}
      const marker = 'data-zen-attr-' + binding.target;
      const selector = '[' + CSS.escape(marker) + '="' + CSS.escape(binding.id) + '"]';
      document.querySelectorAll(selector).forEach((el) => {{
        write(el, binding.target, value);
      }});
    }}
  }};
  zen.subscribe(apply);
}})();"#,
        container = STATE_CONTAINER,
        entries = entries
    );

    RuntimeFragment::new(RuntimeSlot::AttributeBindings, code)
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT DISPATCH
// ═══════════════════════════════════════════════════════════════════════════════

/// Events that do not bubble and are therefore delegated in the capture phase.
const CAPTURE_EVENTS: &[&str] = &[
    "blur",
    "focus",
    "load",
    "error",
    "mouseenter",
    "mouseleave",
    "scroll",
];

pub fn generate_event_runtime(kinds: &EventKindSet) -> RuntimeFragment {
    let kinds_js = serde_json::to_string(kinds).unwrap_or_else(|_| "[]".to_string());
    let capture_js = serde_json::to_string(CAPTURE_EVENTS).unwrap_or_else(|_| "[]".to_string());

    let code = format!(
        r#"// [ZENITH] event dispatch
(function () {{
  const zen = window.__zenith || (window.__zenith = {{}});
  if (zen.eventsReady) return;
  zen.eventsReady = true;

  zen.show = (el) => {{ el.style.display = ''; }};
  zen.hide = (el) => {{ el.style.display = 'none'; }};
  zen.toggleClass = (el, name, force) => el.classList.toggle(name, force);
  zen.setText = (el, text) => {{ el.textContent = text === undefined || text === null ? '' : String(text); }};
  zen.setHTML = (el, html) => {{ el.innerHTML = html === undefined || html === null ? '' : String(html); }};

  const handlers = zen.handlers || (zen.handlers = new Map());
  zen.register = (name, fn) => {{
    if (typeof fn === 'function') handlers.set(name, fn);
  }};
  const lookup = (name) => {{
    if (!handlers.has(name) && typeof window[name] === 'function') {{
      handlers.set(name, window[name]);
    }}
    return handlers.get(name);
  }};

  const capture = new Set({capture});
  const kinds = {kinds};
  kinds.forEach((kind) => {{
    const marker = 'data-zen-' + kind;
    document.addEventListener(kind, (event) => {{
      let el = event.target;
      while (el && el.nodeType !== 1) el = el.parentNode;
      while (el && el !== document) {{
        if (el.hasAttribute && el.hasAttribute(marker)) {{
          const handler = lookup(el.getAttribute(marker));
          if (typeof handler === 'function') handler(event, el);
          return;
        }}
        el = el.parentNode;
      }}
    }}, capture.has(kind));
  }});
}})();"#,
        capture = capture_js,
        kinds = kinds_js
    );

    RuntimeFragment::new(RuntimeSlot::EventDispatch, code)
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYNTHESIS & ASSEMBLY
// ═══════════════════════════════════════════════════════════════════════════════

pub fn synthesize(event_kinds: &EventKindSet, bindings: &PageBindings) -> PageRuntime {
    PageRuntime {
        text_bindings: generate_text_binding_runtime(&bindings.state, &bindings.text),
        attribute_bindings: generate_attribute_binding_runtime(&bindings.attributes),
        events: generate_event_runtime(event_kinds),
        needs_slot: !event_kinds.is_empty() || !bindings.is_empty(),
    }
}

/// Combine runtime fragments with the page's script bodies, one output per slot.
pub fn assemble_scripts(scripts: &[ScriptBlock], runtime: &PageRuntime) -> Vec<AssembledScript> {
    let synthesized;
    let scripts = if scripts.is_empty() && runtime.needs_slot() {
        synthesized = [ScriptBlock {
            index: 0,
            content: String::new(),
        }];
        &synthesized[..]
    } else {
        scripts
    };

    scripts
        .iter()
        .enumerate()
        .map(|(position, script)| {
            let content = if position == 0 {
                let mut parts: Vec<&RuntimeFragment> =
                    vec![&runtime.text_bindings, &runtime.attribute_bindings];
                parts.retain(|f| !f.is_empty());

                let mut pieces: Vec<&str> = parts.iter().map(|f| f.code.as_str()).collect();
                if !script.content.trim().is_empty() {
                    pieces.push(script.content.as_str());
                }
                if !runtime.events.is_empty() {
                    pieces.push(runtime.events.code.as_str());
                }
                pieces.join("\n\n")
            } else {
                script.content.clone()
            };

            AssembledScript {
                index: script.index,
                content,
            }
        })
        .collect()
}
