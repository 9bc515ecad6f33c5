//! JavaScript sources installed in the sandbox engine.
//!
//! The engine has no DOM and no network, so `react`, `react-dom` and every
//! external package are replaced by small modules. The `react` stand-in
//! builds element objects and answers hooks with their initial values; the
//! `react-dom/client` stand-in walks the element tree once, calling every
//! function and class component, and throws the same errors React does for
//! invalid element types and object children.

use std::collections::BTreeSet;

/// Name of the module that boots the preview.
pub(crate) const BOOT_MODULE: &str = "@studio/boot";

/// Browser globals a component may touch while rendering.
///
/// Storage APIs are deliberately absent; the preview iframe never gets them.
pub(crate) const GLOBALS: &str = r#"
const noop = () => {};
const node = (tagName) => ({
  tagName,
  style: {},
  children: [],
  appendChild(child) { this.children.push(child); return child; },
  removeChild: noop,
  setAttribute: noop,
  addEventListener: noop,
  removeEventListener: noop,
});
globalThis.window = globalThis;
globalThis.self = globalThis;
globalThis.console = { log: noop, info: noop, warn: noop, error: noop, debug: noop };
globalThis.setTimeout = () => 0;
globalThis.clearTimeout = noop;
globalThis.setInterval = () => 0;
globalThis.clearInterval = noop;
globalThis.requestAnimationFrame = () => 0;
globalThis.cancelAnimationFrame = noop;
globalThis.queueMicrotask = (callback) => { Promise.resolve().then(callback); };
globalThis.fetch = () => new Promise(noop);
globalThis.addEventListener = noop;
globalThis.removeEventListener = noop;
globalThis.navigator = { userAgent: "component-studio" };
globalThis.document = {
  body: node("BODY"),
  head: node("HEAD"),
  getElementById: (id) => Object.assign(node("DIV"), { id }),
  querySelector: () => null,
  querySelectorAll: () => [],
  createElement: node,
  createTextNode: (text) => ({ text }),
  addEventListener: noop,
  removeEventListener: noop,
};
"#;

/// Names the `react` stand-in exports.
const REACT_EXPORTS: [&str; 39] = [
    "Children",
    "Component",
    "Fragment",
    "Profiler",
    "PureComponent",
    "StrictMode",
    "Suspense",
    "cloneElement",
    "createContext",
    "createElement",
    "createRef",
    "forwardRef",
    "isValidElement",
    "lazy",
    "memo",
    "startTransition",
    "use",
    "useActionState",
    "useCallback",
    "useContext",
    "useDebugValue",
    "useDeferredValue",
    "useEffect",
    "useId",
    "useImperativeHandle",
    "useInsertionEffect",
    "useLayoutEffect",
    "useMemo",
    "useOptimistic",
    "useReducer",
    "useRef",
    "useState",
    "useSyncExternalStore",
    "useTransition",
    "version",
    "act",
    "createFactory",
    "cache",
    "useFormStatus",
];

const REACT: &str = r#"
const ELEMENT = Symbol.for("react.element");
const noop = () => {};
export const Fragment = Symbol.for("react.fragment");
export const StrictMode = Symbol.for("react.strict_mode");
export const Profiler = Symbol.for("react.profiler");
export const Suspense = Symbol.for("react.suspense");
export const version = "18.3.1-studio";

export function createElement(type, config, ...children) {
  const props = {};
  let key = null;
  if (config != null) {
    for (const name of Object.keys(config)) {
      if (name === "key") key = String(config.key);
      else if (name !== "ref") props[name] = config[name];
    }
  }
  if (children.length === 1) props.children = children[0];
  else if (children.length > 1) props.children = children;
  if (type && type.defaultProps) {
    for (const name of Object.keys(type.defaultProps)) {
      if (props[name] === undefined) props[name] = type.defaultProps[name];
    }
  }
  return { $$typeof: ELEMENT, type, key, props };
}
export const createFactory = (type) => (props, ...children) =>
  createElement(type, props, ...children);
export const isValidElement = (value) =>
  value !== null && typeof value === "object" && value.$$typeof === ELEMENT;
export function cloneElement(element, config, ...children) {
  const props = { ...element.props, ...(config || {}) };
  if (children.length === 1) props.children = children[0];
  else if (children.length > 1) props.children = children;
  return { ...element, props };
}

export function Component(props, context) {
  this.props = props;
  this.context = context;
  this.state = null;
}
Component.prototype.isReactComponent = {};
Component.prototype.setState = noop;
Component.prototype.forceUpdate = noop;
export function PureComponent(props, context) {
  Component.call(this, props, context);
}
PureComponent.prototype = Object.create(Component.prototype);
PureComponent.prototype.constructor = PureComponent;

export function createContext(defaultValue) {
  const context = { $$typeof: Symbol.for("react.context"), _currentValue: defaultValue };
  context.Provider = { $$typeof: Symbol.for("react.provider"), _context: context };
  context.Consumer = { $$typeof: Symbol.for("react.consumer"), _context: context };
  return context;
}
export const createRef = () => ({ current: null });
export const forwardRef = (render) => ({ $$typeof: Symbol.for("react.forward_ref"), render });
export const memo = (type) => ({ $$typeof: Symbol.for("react.memo"), type });
export const lazy = (load) => ({ $$typeof: Symbol.for("react.lazy"), load });

let ids = 0;
const initial = (value) => (typeof value === "function" ? value() : value);
export const useState = (value) => [initial(value), noop];
export const useReducer = (reducer, arg, init) => [init ? init(arg) : arg, noop];
export const useRef = (current) => ({ current });
export const useMemo = (compute) => compute();
export const useCallback = (callback) => callback;
export const useContext = (context) => context._currentValue;
export const useEffect = noop;
export const useLayoutEffect = noop;
export const useInsertionEffect = noop;
export const useImperativeHandle = noop;
export const useDebugValue = noop;
export const useId = () => `:s${ids++}:`;
export const useDeferredValue = (value) => value;
export const useTransition = () => [false, (callback) => callback()];
export const startTransition = (callback) => callback();
export const useSyncExternalStore = (subscribe, getSnapshot) => getSnapshot();
export const useOptimistic = (state) => [state, noop];
export const useActionState = (action, state) => [state, noop, false];
export const useFormStatus = () => ({ pending: false, data: null, method: null, action: null });
export const use = (resource) =>
  resource && resource._currentValue !== undefined ? resource._currentValue : resource;
export const cache = (fn) => fn;
export const act = (callback) => { callback(); return Promise.resolve(); };

const toArray = (children) =>
  children == null ? [] : Array.isArray(children) ? children.flat(Infinity) : [children];
export const Children = {
  toArray,
  map: (children, fn) => toArray(children).map(fn),
  forEach: (children, fn) => { toArray(children).forEach(fn); },
  count: (children) => toArray(children).length,
  only: (children) => {
    if (!isValidElement(children)) {
      throw new Error("React.Children.only expected to receive a single React element child.");
    }
    return children;
  },
};
"#;

const REACT_DOM_CLIENT: &str = r#"
const ELEMENT = Symbol.for("react.element");
const MAX_DEPTH = 512;
const passthrough = new Set([
  Symbol.for("react.fragment"),
  Symbol.for("react.strict_mode"),
  Symbol.for("react.profiler"),
  Symbol.for("react.suspense"),
]);

const describe = (type) => (type === null ? "null" : Array.isArray(type) ? "array" : typeof type);

function invalidType(type) {
  return new Error(
    "Element type is invalid: expected a string (for built-in components) or a class/function " +
      `(for composite components) but got: ${describe(type)}.`,
  );
}

function mountChildren(children, depth) {
  if (children == null || typeof children === "boolean") return;
  if (["string", "number", "bigint", "function"].includes(typeof children)) return;
  if (Array.isArray(children)) {
    for (const child of children) mountChildren(child, depth);
    return;
  }
  if (typeof children === "object" && children.$$typeof === ELEMENT) {
    mount(children, depth + 1);
    return;
  }
  if (typeof children === "object" && typeof children[Symbol.iterator] === "function") {
    for (const child of children) mountChildren(child, depth);
    return;
  }
  throw new Error(
    "Objects are not valid as a React child " +
      `(found: object with keys {${Object.keys(children).join(", ")}}).`,
  );
}

function mountComponent(type, props, depth) {
  if (type.prototype && type.prototype.isReactComponent) {
    const instance = new type(props);
    instance.props = props;
    if (typeof type.getDerivedStateFromProps === "function") {
      const derived = type.getDerivedStateFromProps(props, instance.state);
      instance.state = { ...(instance.state || {}), ...(derived || {}) };
    }
    if (typeof instance.render !== "function") throw invalidType(type);
    mountChildren(instance.render(), depth);
    return;
  }
  mountChildren(type(props), depth);
}

function mount(element, depth) {
  if (depth > MAX_DEPTH) throw new RangeError("Component tree is nested too deeply");
  const { type, props } = element;
  if (typeof type === "string") {
    mountChildren(props.children, depth);
  } else if (typeof type === "function") {
    mountComponent(type, props, depth);
  } else if (passthrough.has(type)) {
    mountChildren(props.children, depth);
  } else if (type !== null && typeof type === "object") {
    switch (type.$$typeof) {
      case Symbol.for("react.provider"): {
        const context = type._context;
        const previous = context._currentValue;
        context._currentValue = props.value;
        try {
          mountChildren(props.children, depth);
        } finally {
          context._currentValue = previous;
        }
        return;
      }
      case Symbol.for("react.context"): {
        const previous = type._currentValue;
        type._currentValue = props.value;
        try {
          mountChildren(props.children, depth);
        } finally {
          type._currentValue = previous;
        }
        return;
      }
      case Symbol.for("react.consumer"):
        mountChildren(props.children(type._context._currentValue), depth);
        return;
      case Symbol.for("react.forward_ref"):
        mountChildren(type.render(props, null), depth);
        return;
      case Symbol.for("react.memo"):
        mount({ ...element, type: type.type }, depth + 1);
        return;
      case Symbol.for("react.lazy"):
        return;
      default:
        throw invalidType(type);
    }
  } else {
    throw invalidType(type);
  }
}

export function createRoot(container) {
  if (container == null) throw new Error("Target container is not a DOM element.");
  return {
    render(element) {
      mountChildren(element, 0);
    },
    unmount() {},
  };
}
export const hydrateRoot = (container, element) => {
  const root = createRoot(container);
  root.render(element);
  return root;
};
export default { createRoot, hydrateRoot };
"#;

const REACT_DOM: &str = r#"
import { createRoot } from "react-dom/client";
export const createPortal = (children) => children;
export const flushSync = (callback) => (callback ? callback() : undefined);
export const render = (element, container) => { createRoot(container).render(element); };
export const unmountComponentAtNode = () => true;
export const version = "18.3.1-studio";
export default { createPortal, flushSync, render, unmountComponentAtNode, version };
"#;

/// Source of the `react` stand-in.
///
/// `required` lists names importers ask for; names React does not define
/// are exported as inert components so linking succeeds.
pub(crate) fn react_source(required: &BTreeSet<String>) -> String {
    let mut code = String::from(REACT);
    code.push_str("export default {\n");
    for name in REACT_EXPORTS {
        code.push_str(&format!("  {name},\n"));
    }
    code.push_str("};\n");
    append_inert_exports(&mut code, required, &REACT_EXPORTS);
    code
}

/// Source of a `react-dom` entry point, if `specifier` names one.
pub(crate) const fn react_dom_source(specifier: &str) -> Option<&'static str> {
    match specifier.as_bytes() {
        b"react-dom/client" => Some(REACT_DOM_CLIENT),
        b"react-dom" => Some(REACT_DOM),
        _ => None,
    }
}

/// Source of a stand-in for an external package.
///
/// Every export, default included, is a component that renders nothing.
pub(crate) fn package_source(required: &BTreeSet<String>) -> String {
    let mut code = String::from("const inert = () => null;\nexport default inert;\n");
    append_inert_exports(&mut code, required, &[]);
    code
}

/// Source of the boot module that renders the entry's default export.
pub(crate) fn boot_source(entry_key: &str, entry_path: &str) -> String {
    let key = serde_json::Value::String(entry_key.to_string());
    let message =
        serde_json::Value::String(format!("{entry_path} must default-export a component"));
    format!(
        r#"import {{ createElement }} from "react";
import {{ createRoot }} from "react-dom/client";
import * as entry from {key};
const App = entry.default;
const renderable = typeof App === "function" ||
  (App !== null && typeof App === "object" && typeof App.$$typeof === "symbol");
if (!renderable) {{
  throw new TypeError({message} + ", got " + (App === null ? "null" : typeof App));
}}
createRoot(document.getElementById("root")).render(createElement(App));
"#
    )
}

fn append_inert_exports(code: &mut String, required: &BTreeSet<String>, defined: &[&str]) {
    let extra: Vec<_> = required
        .iter()
        .filter(|name| name.as_str() != "default" && !defined.contains(&name.as_str()))
        .filter(|name| is_identifier(name))
        .collect();
    if extra.is_empty() {
        return;
    }
    code.push_str("const __inert = () => null;\nexport {\n");
    for name in extra {
        code.push_str(&format!("  __inert as {name},\n"));
    }
    code.push_str("};\n");
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_react_adds_unknown_names_only() {
        let code = react_source(&names(&["useState", "unstable_Thing"]));
        assert!(code.contains("__inert as unstable_Thing"));
        assert!(!code.contains("__inert as useState"));
    }

    #[test]
    fn test_package_skips_default_and_invalid_names() {
        let code = package_source(&names(&["default", "Chart", "not-a-name"]));
        assert!(code.contains("__inert as Chart"));
        assert!(!code.contains("not-a-name"));
        assert_eq!(code.matches("export default").count(), 1);
    }

    #[test]
    fn test_react_dom_entry_points() {
        assert!(react_dom_source("react-dom/client").is_some());
        assert!(react_dom_source("react-dom").is_some());
        assert!(react_dom_source("react-dom/server").is_none());
    }

    #[test]
    fn test_boot_names_entry() {
        let boot = boot_source("@vfs/App.jsx", "/App.jsx");
        assert!(boot.contains(r#"import * as entry from "@vfs/App.jsx";"#));
        assert!(boot.contains("/App.jsx must default-export a component"));
    }
}
