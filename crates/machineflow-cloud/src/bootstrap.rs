//! Built-in bootstrap payloads
//!
//! Control-plane machines receive [`CONTROL_PLANE_USER_DATA`] as user data
//! unless the reconciler is configured with an override.

/// kubeadm init on containerd, then Calico networking
pub const CONTROL_PLANE_USER_DATA: &str = r#"#!/usr/bin/env bash

cat >/tmp/kubeadm.yaml <<EOF
apiVersion: kubeadm.k8s.io/v1alpha3
kind: InitConfiguration
nodeRegistration:
  criSocket: /var/run/containerd/containerd.sock
EOF

kubeadm init --config /tmp/kubeadm.yaml

# Calico v3.2 (Kubernetes datastore)
kubectl --kubeconfig /etc/kubernetes/admin.conf apply -f https://docs.projectcalico.org/v3.2/getting-started/kubernetes/installation/hosted/rbac-kdd.yaml
kubectl --kubeconfig /etc/kubernetes/admin.conf apply -f https://docs.projectcalico.org/v3.2/getting-started/kubernetes/installation/hosted/kubernetes-datastore/calico-networking/1.7/calico.yaml
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_plane_script() {
        assert!(CONTROL_PLANE_USER_DATA.starts_with("#!/usr/bin/env bash"));
        assert!(CONTROL_PLANE_USER_DATA.contains("kubeadm init --config /tmp/kubeadm.yaml"));
        assert!(CONTROL_PLANE_USER_DATA.contains("calico.yaml"));
    }
}
