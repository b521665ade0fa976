//! Proxy resolution.
//!
//! A proxy stands in for an object identified by a [`Uri`]. Resolution
//! looks the URI up through the resource set; failure is not an error and
//! leaves the proxy in place for the caller to report or retry.

use objgraph_meta::ObjectId;

use crate::{Graph, Uri};

impl Graph {
    pub fn is_proxy(&self, obj: ObjectId) -> bool {
        self.objects
            .get(obj.index())
            .is_some_and(|data| data.proxy_uri.is_some())
    }

    pub fn proxy_uri(&self, obj: ObjectId) -> Option<&Uri> {
        self.objects.get(obj.index())?.proxy_uri.as_ref()
    }

    /// Resolve `proxy` using `context` to scope relative lookups.
    ///
    /// Returns the resolved object, or `proxy` itself when it cannot be
    /// resolved or is not a proxy. A resolved object whose class does not
    /// fit the proxy's expected class is rejected.
    pub fn resolve_proxy(&mut self, proxy: ObjectId, context: ObjectId) -> ObjectId {
        let Some(uri) = self.proxy_uri(proxy).cloned() else {
            return proxy;
        };
        let Some(resolved) = self.object_by_uri(&uri, context) else {
            tracing::debug!(%proxy, %uri, "proxy left unresolved");
            return proxy;
        };
        if resolved == proxy || self.is_proxy(resolved) {
            return proxy;
        }
        if let Some(expected) = self.objects[proxy.index()].class {
            if !self.is_instance(expected, resolved) {
                tracing::warn!(%proxy, %uri, %resolved, "resolved object has the wrong class");
                return proxy;
            }
        }
        tracing::debug!(%proxy, %uri, %resolved, "resolved proxy");
        resolved
    }

    /// Find the object a URI addresses.
    ///
    /// An empty resource part, or one naming the context's own resource,
    /// resolves the fragment locally. Other resources are looked up and,
    /// when the graph's options allow it, loaded on demand.
    pub fn object_by_uri(&mut self, uri: &Uri, context: ObjectId) -> Option<ObjectId> {
        let fragment = uri.fragment()?;
        let local = self.e_resource(context);
        let same_resource = local
            .and_then(|r| self.resource_uri(r).ok())
            .is_some_and(|r| r.resource() == uri.resource());

        let resource = if uri.resource().is_empty() || same_resource {
            local?
        } else {
            let load_on_demand = self.options.load_on_demand;
            match self.resource_by_uri(&uri.trim_fragment(), load_on_demand) {
                Ok(found) => found?,
                Err(err) => {
                    tracing::warn!(%uri, %err, "could not load resource for proxy");
                    return None;
                }
            }
        };
        self.object_by_fragment(resource, fragment)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use objgraph_meta::{Metamodel, Value};

    use crate::{Error, Graph, Uri};

    #[test]
    fn proxies_refuse_the_reflective_protocol() {
        let mut mm = Metamodel::new();
        let pkg = mm.create_package("p", "urn:p");
        let node = mm.create_class(pkg, "Node");
        let next = mm.add_reference(node, "next", node);
        let mut graph = Graph::new(Rc::new(mm));

        let proxy = graph.create_proxy(Uri::parse("other.model#/0"), Some(node));
        assert!(graph.is_proxy(proxy));
        assert_eq!(graph.proxy_uri(proxy).map(Uri::to_string).as_deref(), Some("other.model#/0"));
        assert!(matches!(graph.get(proxy, next), Err(Error::UnresolvedProxy { .. })));
        assert!(matches!(
            graph.set(proxy, next, Value::Null),
            Err(Error::UnresolvedProxy { .. })
        ));
        assert!(matches!(graph.is_set(proxy, next), Err(Error::UnresolvedProxy { .. })));
        assert!(matches!(graph.unset(proxy, next), Err(Error::UnresolvedProxy { .. })));
    }

    #[test]
    fn resolving_a_non_proxy_is_identity() {
        let mut mm = Metamodel::new();
        let pkg = mm.create_package("p", "urn:p");
        let node = mm.create_class(pkg, "Node");
        let mut graph = Graph::new(Rc::new(mm));
        let obj = graph.create(node).unwrap();
        assert_eq!(graph.resolve_proxy(obj, obj), obj);
    }

    #[test]
    fn unresolvable_proxy_comes_back_unchanged() {
        let mut mm = Metamodel::new();
        let pkg = mm.create_package("p", "urn:p");
        let node = mm.create_class(pkg, "Node");
        let mut graph = Graph::new(Rc::new(mm));
        let ctx = graph.create(node).unwrap();
        let proxy = graph.create_proxy(Uri::parse("#/3"), None);
        assert_eq!(graph.resolve_proxy(proxy, ctx), proxy);
        assert_eq!(graph.resolve_proxy(proxy, ctx), proxy);
        assert!(graph.is_proxy(proxy));
    }
}
